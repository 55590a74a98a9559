#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/montreal/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dataset;
pub mod deep;
pub mod ensemble;
pub mod error;
pub mod estimators;
pub mod metrics;
pub mod scaling;
pub mod selector;
pub mod strategy;

pub use dataset::{Dataset, k_fold, split_indices};
pub use deep::{DeepConfig, DeepElimination, PathChoice, SelectionPath, choose_path};
pub use ensemble::{
    CandidateScore, Comparison, EnsembleOutcome, EvaluationConfig, HeterogeneousEnsemble,
    StrategyRun, compare, evaluate, union_combine,
};
pub use error::{Result, SelectionError};
pub use scaling::Scaler;
pub use selector::{FactorSelection, SelectionConfig, SelectionOutcome, SelectionResult};
pub use strategy::{
    CorrelationSelector, FeatureSelector, ImportanceSelector, MutualInfoSelector,
    RecursiveElimination, RegularizedSelector, StrategyKind,
};
