//! End-to-end selection: ensemble path, deep path, decision, reduced panel.

use crate::dataset::Dataset;
use crate::deep::{DeepConfig, DeepElimination, PathChoice, SelectionPath, choose_path};
use crate::ensemble::{EnsembleOutcome, EvaluationConfig, HeterogeneousEnsemble};
use crate::error::{Result, SelectionError};
use crate::estimators::BoostingConfig;
use crate::strategy::StrategyKind;
use montreal_data::{FactorList, Panel};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Selection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Cardinality for ranking and wrapper strategies (default: 10)
    pub n_features_to_select: usize,
    /// Entities drawn for the ensemble path; `None` uses all (default: 50)
    pub sample_entities: Option<usize>,
    /// Seed for sampling, splits and estimators (default: 42)
    pub seed: u64,
    /// Deep elimination target cardinality (default: 50)
    pub deep_n_features: usize,
    /// Deep elimination step (default: 5)
    pub deep_step: usize,
    /// Held-out share for every evaluation (default: 0.2)
    pub test_fraction: f64,
    /// Strategies of the ensemble path (default: all)
    pub strategies: Vec<StrategyKind>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            n_features_to_select: 10,
            sample_entities: Some(50),
            seed: 42,
            deep_n_features: 50,
            deep_step: 5,
            test_fraction: 0.2,
            strategies: StrategyKind::ALL.to_vec(),
        }
    }
}

impl SelectionConfig {
    /// Check cardinalities and the held-out share.
    pub fn validate(&self) -> Result<()> {
        if self.n_features_to_select == 0 || self.deep_n_features == 0 {
            return Err(SelectionError::InvalidParameter(
                "target feature counts must be positive".into(),
            ));
        }
        if self.deep_step == 0 {
            return Err(SelectionError::InvalidParameter("deep_step must be positive".into()));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(SelectionError::InvalidParameter(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.strategies.is_empty() {
            return Err(SelectionError::InvalidParameter(
                "at least one strategy is required".into(),
            ));
        }
        Ok(())
    }

    /// The ensemble path described by these settings.
    pub fn ensemble(&self) -> HeterogeneousEnsemble {
        let mut ensemble = HeterogeneousEnsemble::new(&self.strategies);
        ensemble.k = Some(self.n_features_to_select);
        ensemble.sample_entities = self.sample_entities;
        ensemble.seed = self.seed;
        ensemble.evaluation = EvaluationConfig {
            estimator: BoostingConfig {
                seed: self.seed,
                ..Default::default()
            },
            test_fraction: self.test_fraction,
            seed: self.seed,
        };
        ensemble
    }

    /// The deep path described by these settings.
    pub fn deep(&self) -> DeepElimination {
        DeepElimination::new(DeepConfig {
            n_features: self.deep_n_features,
            step: self.deep_step,
            test_fraction: self.test_fraction,
            seed: self.seed,
            estimator: BoostingConfig {
                seed: self.seed,
                ..BoostingConfig::large()
            },
        })
    }
}

/// Reduced factor list and the panel restricted to it.
#[derive(Debug, Clone)]
pub struct SelectionResult {
    /// Selected factors
    pub factors: FactorList,
    /// Panel with the extract columns plus exactly the selected factors
    pub panel: Panel,
}

/// Everything a selection run produced.
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    /// Persisted result of the winning path
    pub result: SelectionResult,
    /// Ensemble path details
    pub ensemble: EnsembleOutcome,
    /// Deep path selection
    pub deep: Vec<String>,
    /// Two-path decision
    pub choice: PathChoice,
}

/// Runs both selection paths on a cleaned panel and keeps the better one.
#[derive(Debug, Clone, Default)]
pub struct FactorSelection {
    config: SelectionConfig,
}

impl FactorSelection {
    /// New runner.
    pub const fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    /// Active settings.
    pub const fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Run the ensemble and deep paths and restrict `panel` to the winner.
    pub fn run(&self, factors: &FactorList, panel: &Panel) -> Result<SelectionOutcome> {
        self.config.validate()?;
        if factors.is_empty() || panel.is_empty() {
            return Err(SelectionError::EmptyDataset(format!(
                "{} factors over {} rows",
                factors.len(),
                panel.height()
            )));
        }

        let ensemble = self.config.ensemble().run(factors, panel)?;

        let full = Dataset::from_panel(panel, factors)?;
        let deep = self.config.deep();
        let deep_features = deep.run(&full)?;

        let choice = choose_path(
            deep.score(&full, &ensemble.union)?,
            deep.score(&full, &deep_features)?,
        );
        info!(
            ensemble_r2 = choice.ensemble_r2,
            deep_r2 = choice.deep_r2,
            chosen = %choice.chosen,
            "Compared selection paths"
        );

        let chosen = match choice.chosen {
            SelectionPath::Ensemble => ensemble.union.clone(),
            SelectionPath::Deep => deep_features.clone(),
        };
        if chosen.is_empty() {
            return Err(SelectionError::EmptyDataset(
                "both selection paths returned no factors".into(),
            ));
        }
        let factors = FactorList::new(chosen)?;
        let reduced = panel.extract(&factors, None)?;

        Ok(SelectionOutcome {
            result: SelectionResult {
                factors,
                panel: reduced,
            },
            ensemble,
            deep: deep_features,
            choice,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SelectionConfig::default();
        assert_eq!(config.n_features_to_select, 10);
        assert_eq!(config.sample_entities, Some(50));
        assert_eq!(config.deep_n_features, 50);
        assert_eq!(config.deep_step, 5);
        assert_eq!(config.strategies.len(), 6);
        assert!(config.validate().is_ok());

        let deep = config.deep();
        assert_eq!(deep.config().estimator.n_estimators, 500);
        assert_eq!(deep.config().estimator.subsample, 0.8);
        assert_eq!(config.ensemble().strategies().len(), 6);
    }

    #[test]
    fn test_validate_rejects_empty_strategies() {
        let config = SelectionConfig {
            strategies: vec![],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
