//! Feature selection strategies sharing the [`FeatureSelector`] contract.

pub mod correlation;
pub mod importance;
pub mod mutual_info;
pub mod recursive;
pub mod regularized;

pub use correlation::CorrelationSelector;
pub use importance::ImportanceSelector;
pub use mutual_info::MutualInfoSelector;
pub use recursive::{EliminationModel, RecursiveElimination};
pub use regularized::RegularizedSelector;

use crate::dataset::Dataset;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cardinality used by ranking and wrapper strategies when none is given.
pub const DEFAULT_K: usize = 10;

/// Chooses a subset of a dataset's feature columns.
pub trait FeatureSelector: fmt::Debug + Send + Sync {
    /// Human-readable strategy name, used in logs and reports.
    fn name(&self) -> &str;

    /// Names of the selected features, at most `k` for ranking strategies.
    ///
    /// Strategies that pick their own cardinality (the regularized ones)
    /// ignore `k`.
    fn select(&self, data: &Dataset, k: Option<usize>) -> Result<Vec<String>>;
}

/// Configurable strategy identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// |Pearson r| with the target
    Correlation,
    /// Binned mutual information with the target
    MutualInformation,
    /// Recursive elimination with a grid-searched boosted model
    RecursiveElimination,
    /// L1-penalized regression
    Lasso,
    /// L1/L2-penalized regression
    ElasticNet,
    /// Boosted-tree total gain
    Importance,
}

impl StrategyKind {
    /// Every strategy, in the order they are run.
    pub const ALL: [Self; 6] = [
        Self::Correlation,
        Self::MutualInformation,
        Self::RecursiveElimination,
        Self::Lasso,
        Self::ElasticNet,
        Self::Importance,
    ];

    /// Instantiate with default settings.
    pub fn build(self) -> Box<dyn FeatureSelector> {
        match self {
            Self::Correlation => Box::new(CorrelationSelector),
            Self::MutualInformation => Box::new(MutualInfoSelector::default()),
            Self::RecursiveElimination => Box::new(RecursiveElimination::default()),
            Self::Lasso => Box::new(RegularizedSelector::lasso()),
            Self::ElasticNet => Box::new(RegularizedSelector::elastic_net()),
            Self::Importance => Box::new(ImportanceSelector::default()),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Correlation => "correlation",
            Self::MutualInformation => "mutual_information",
            Self::RecursiveElimination => "recursive_elimination",
            Self::Lasso => "lasso",
            Self::ElasticNet => "elastic_net",
            Self::Importance => "importance",
        };
        f.write_str(name)
    }
}

/// Names of the `k` highest-scoring features; ties keep column order.
///
/// NaN scores rank as 0.
pub fn top_k(features: &[String], scores: &[f64], k: usize) -> Vec<String> {
    let mut order: Vec<usize> = (0..features.len()).collect();
    let score = |j: usize| if scores[j].is_nan() { 0.0 } else { scores[j] };
    order.sort_by(|&a, &b| score(b).total_cmp(&score(a)).then(a.cmp(&b)));
    order
        .into_iter()
        .take(k)
        .map(|j| features[j].clone())
        .collect()
}
