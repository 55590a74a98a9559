//! Deep elimination path and the final two-path decision.

use crate::dataset::Dataset;
use crate::error::Result;
use crate::estimators::BoostingConfig;
use crate::metrics::r2;
use crate::scaling::Scaler;
use crate::strategy::RecursiveElimination;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Settings shared by deep elimination and the held-out R² scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepConfig {
    /// Target cardinality (default: 50)
    pub n_features: usize,
    /// Features dropped per round (default: 5)
    pub step: usize,
    /// Held-out share (default: 0.2)
    pub test_fraction: f64,
    /// Split seed (default: 42)
    pub seed: u64,
    /// Estimator (default: [`BoostingConfig::large`])
    pub estimator: BoostingConfig,
}

impl Default for DeepConfig {
    fn default() -> Self {
        Self {
            n_features: 50,
            step: 5,
            test_fraction: 0.2,
            seed: 42,
            estimator: BoostingConfig::large(),
        }
    }
}

/// Recursive elimination with a large fixed estimator on the robust-scaled
/// training split of the full factor matrix.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeepElimination {
    config: DeepConfig,
}

impl DeepElimination {
    /// New runner.
    pub const fn new(config: DeepConfig) -> Self {
        Self { config }
    }

    /// Active settings.
    pub const fn config(&self) -> &DeepConfig {
        &self.config
    }

    /// Surviving feature names, in column order.
    pub fn run(&self, data: &Dataset) -> Result<Vec<String>> {
        let (train, _) = data.train_test_split(self.config.test_fraction, self.config.seed)?;
        let scaled = Dataset {
            x: Scaler::robust(&train.x).transform(&train.x),
            ..train
        };
        let rfe = RecursiveElimination::fixed(self.config.estimator, self.config.step);
        let support = rfe.support(&scaled, self.config.n_features)?;
        let features: Vec<String> = support
            .into_iter()
            .map(|j| scaled.features[j].clone())
            .collect();
        info!(
            from = data.n_features(),
            to = features.len(),
            step = self.config.step,
            "Deep elimination done"
        );
        Ok(features)
    }

    /// Held-out R² of the estimator on `features`, robust-scaled on the training split.
    ///
    /// An empty subset scores `-inf`.
    pub fn score(&self, data: &Dataset, features: &[String]) -> Result<f64> {
        if features.is_empty() {
            return Ok(f64::NEG_INFINITY);
        }
        let subset = data.subset(features)?;
        let (train, test) = subset.train_test_split(self.config.test_fraction, self.config.seed)?;
        let scaler = Scaler::robust(&train.x);
        let model = self.config.estimator.fit(&scaler.transform(&train.x), &train.y)?;
        let predicted = model.predict(&scaler.transform(&test.x));
        Ok(r2(test.y.view(), predicted.view()))
    }
}

/// Which selection path produced the persisted result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPath {
    /// Union of the heterogeneous ensemble
    Ensemble,
    /// Deep recursive elimination
    Deep,
}

impl fmt::Display for SelectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ensemble => f.write_str("ensemble"),
            Self::Deep => f.write_str("deep elimination"),
        }
    }
}

/// Outcome of the two-path comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathChoice {
    /// Winning path
    pub chosen: SelectionPath,
    /// Held-out R² of the ensemble union
    pub ensemble_r2: f64,
    /// Held-out R² of the deep elimination subset
    pub deep_r2: f64,
}

/// Pick the path with the higher held-out R²; ties prefer the ensemble.
pub fn choose_path(ensemble_r2: f64, deep_r2: f64) -> PathChoice {
    let chosen = if deep_r2 > ensemble_r2 {
        SelectionPath::Deep
    } else {
        SelectionPath::Ensemble
    };
    PathChoice {
        chosen,
        ensemble_r2,
        deep_r2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn small_config(n_features: usize) -> DeepConfig {
        DeepConfig {
            n_features,
            step: 2,
            estimator: BoostingConfig::large().with_rounds(20, 0.2),
            ..Default::default()
        }
    }

    fn data() -> Dataset {
        let x = Array2::from_shape_fn((100, 6), |(i, j)| match j {
            2 => i as f64,
            _ => ((i * (j + 2)) % 5) as f64,
        });
        let y = x.column(2).mapv(|v| (v / 10.0).sin());
        let features = (0..6).map(|j| format!("f{j}")).collect();
        Dataset::new(x, y, features).unwrap()
    }

    #[test]
    fn test_choose_path_ties_prefer_ensemble() {
        assert_eq!(choose_path(0.1, 0.1).chosen, SelectionPath::Ensemble);
        assert_eq!(choose_path(0.1, 0.2).chosen, SelectionPath::Deep);
        assert_eq!(choose_path(f64::NEG_INFINITY, -5.0).chosen, SelectionPath::Deep);
    }

    #[test]
    fn test_run_reaches_target_and_keeps_signal() {
        let deep = DeepElimination::new(small_config(2));
        let kept = deep.run(&data()).unwrap();
        assert_eq!(kept.len(), 2);
        assert!(kept.contains(&"f2".to_string()));
    }

    #[test]
    fn test_run_keeps_everything_below_target() {
        let deep = DeepElimination::new(small_config(50));
        assert_eq!(deep.run(&data()).unwrap().len(), 6);
    }

    #[test]
    fn test_score_rewards_the_signal() {
        let deep = DeepElimination::new(small_config(2));
        let data = data();
        let with_signal = deep.score(&data, &["f2".to_string()]).unwrap();
        let without = deep.score(&data, &["f0".to_string()]).unwrap();
        assert!(with_signal > without);
        assert_eq!(deep.score(&data, &[]).unwrap(), f64::NEG_INFINITY);
    }
}
