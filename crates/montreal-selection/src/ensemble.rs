//! Heterogeneous ensemble path: run every strategy, score each subset, union them.

use crate::dataset::Dataset;
use crate::error::Result;
use crate::estimators::BoostingConfig;
use crate::metrics::mse;
use crate::strategy::{FeatureSelector, StrategyKind};
use montreal_data::{FactorList, Panel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::info;

/// Label of the unreduced candidate in comparisons.
pub const ORIGINAL: &str = "Original";

/// Set union of every subset, deduplicated, ordered by first appearance.
pub fn union_combine<S: AsRef<[String]>>(subsets: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    subsets
        .iter()
        .flat_map(|subset| subset.as_ref().iter())
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}

/// Reference estimator and split used to score candidate subsets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Reference model (default: 100 trees, seed 42)
    pub estimator: BoostingConfig,
    /// Held-out share (default: 0.2)
    pub test_fraction: f64,
    /// Split seed (default: 42)
    pub seed: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            estimator: BoostingConfig::default(),
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Held-out MSE of the reference model on `features`; an empty subset scores `+inf`.
pub fn evaluate(data: &Dataset, features: &[String], config: &EvaluationConfig) -> Result<f64> {
    if features.is_empty() {
        return Ok(f64::INFINITY);
    }
    let subset = data.subset(features)?;
    let (train, test) = subset.train_test_split(config.test_fraction, config.seed)?;
    let model = config.estimator.fit(&train.x, &train.y)?;
    Ok(mse(test.y.view(), model.predict(&test.x).view()))
}

/// One scored candidate subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    /// Strategy label
    pub name: String,
    /// Selected features
    pub features: Vec<String>,
    /// Held-out MSE
    pub mse: f64,
}

/// Scores of every candidate, the unreduced set first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Candidates in evaluation order
    pub scores: Vec<CandidateScore>,
    /// Index of the lowest error; ties keep the earlier candidate
    pub best: usize,
}

impl Comparison {
    /// The winning candidate.
    pub fn winner(&self) -> &CandidateScore {
        &self.scores[self.best]
    }
}

/// Score the unreduced feature set followed by each named candidate.
pub fn compare(
    data: &Dataset,
    candidates: &[(String, Vec<String>)],
    config: &EvaluationConfig,
) -> Result<Comparison> {
    let mut scores = Vec::with_capacity(candidates.len() + 1);
    let all = (ORIGINAL.to_string(), data.features.clone());
    for (name, features) in std::iter::once(&all).chain(candidates.iter()) {
        let mse = evaluate(data, features, config)?;
        info!(candidate = %name, features = features.len(), mse, "Evaluated candidate");
        scores.push(CandidateScore {
            name: name.clone(),
            features: features.clone(),
            mse,
        });
    }

    let best = scores
        .iter()
        .enumerate()
        .fold(0, |best, (i, s)| if s.mse < scores[best].mse { i } else { best });
    Ok(Comparison { scores, best })
}

/// One strategy's output and wall-clock time.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyRun {
    /// Strategy name
    pub name: String,
    /// Selected features
    pub features: Vec<String>,
    /// Time spent selecting
    pub elapsed: Duration,
}

/// Everything the ensemble path produced.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleOutcome {
    /// Per-strategy selections, in run order
    pub runs: Vec<StrategyRun>,
    /// Held-out comparison of the runs and the unreduced set
    pub comparison: Comparison,
    /// Union of every strategy's selection
    pub union: Vec<String>,
}

/// Runs a set of strategies on a (possibly entity-sampled) panel and unions the results.
#[derive(Debug)]
pub struct HeterogeneousEnsemble {
    strategies: Vec<Box<dyn FeatureSelector>>,
    /// Cardinality passed to every strategy
    pub k: Option<usize>,
    /// Restrict to this many randomly drawn entities
    pub sample_entities: Option<usize>,
    /// Seed for entity sampling
    pub seed: u64,
    /// Candidate scoring settings
    pub evaluation: EvaluationConfig,
}

impl HeterogeneousEnsemble {
    /// Ensemble over the given strategy kinds with default settings.
    pub fn new(kinds: &[StrategyKind]) -> Self {
        Self::with_strategies(kinds.iter().map(|k| k.build()).collect())
    }

    /// Ensemble over arbitrary selectors.
    pub fn with_strategies(strategies: Vec<Box<dyn FeatureSelector>>) -> Self {
        Self {
            strategies,
            k: None,
            sample_entities: Some(50),
            seed: 42,
            evaluation: EvaluationConfig::default(),
        }
    }

    /// Strategies in run order.
    pub fn strategies(&self) -> &[Box<dyn FeatureSelector>] {
        &self.strategies
    }

    /// Dataset the strategies run on.
    pub fn dataset(&self, factors: &FactorList, panel: &Panel) -> Result<Dataset> {
        match self.sample_entities {
            Some(n) => {
                let entities = panel.sample_entities(n, self.seed)?;
                let sampled = panel.extract(factors, Some(&entities))?;
                info!(
                    entities = entities.len(),
                    rows = sampled.height(),
                    "Sampled entities for selection"
                );
                Dataset::from_panel(&sampled, factors)
            }
            None => Dataset::from_panel(panel, factors),
        }
    }

    /// Run, time and score every strategy, then union their selections.
    pub fn run(&self, factors: &FactorList, panel: &Panel) -> Result<EnsembleOutcome> {
        let data = self.dataset(factors, panel)?;
        let started = Instant::now();

        let mut runs = Vec::with_capacity(self.strategies.len());
        for strategy in &self.strategies {
            let start = Instant::now();
            let features = strategy.select(&data, self.k)?;
            let elapsed = start.elapsed();
            info!(
                strategy = strategy.name(),
                selected = features.len(),
                elapsed = %format_elapsed(elapsed),
                "Strategy completed"
            );
            runs.push(StrategyRun {
                name: strategy.name().to_string(),
                features,
                elapsed,
            });
        }
        info!(
            strategies = runs.len(),
            elapsed = %format_elapsed(started.elapsed()),
            "All strategies completed"
        );

        let candidates: Vec<(String, Vec<String>)> = runs
            .iter()
            .map(|r| (r.name.clone(), r.features.clone()))
            .collect();
        let comparison = compare(&data, &candidates, &self.evaluation)?;
        let subsets: Vec<&[String]> = runs.iter().map(|r| r.features.as_slice()).collect();
        let union = union_combine(&subsets);
        info!(
            union = union.len(),
            best = %comparison.winner().name,
            "Ensemble selection done"
        );

        Ok(EnsembleOutcome {
            runs,
            comparison,
            union,
        })
    }
}

/// `MM:SS`
fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_union_is_order_stable_and_unique() {
        let union = union_combine(&[names(&["b", "a"]), names(&[]), names(&["c", "a", "b", "d"])]);
        assert_eq!(union, names(&["b", "a", "c", "d"]));
    }

    #[test]
    fn test_empty_candidate_never_wins() {
        let x = Array2::from_shape_fn((50, 2), |(i, j)| (i * (j + 1)) as f64);
        let y = x.column(0).mapv(|v| v * 0.5);
        let data = Dataset::new(x, y, names(&["a", "b"])).unwrap();

        let comparison = compare(
            &data,
            &[("empty".to_string(), vec![]), ("a".to_string(), names(&["a"]))],
            &EvaluationConfig::default(),
        )
        .unwrap();
        assert_eq!(comparison.scores[0].name, ORIGINAL);
        assert!(comparison.scores[1].mse.is_infinite());
        assert_ne!(comparison.winner().name, "empty");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(125)), "02:05");
    }
}
