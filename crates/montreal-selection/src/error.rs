//! Error types for feature selection.

use montreal_data::DataError;
use thiserror::Error;

/// Result type for selection operations.
pub type Result<T> = std::result::Result<T, SelectionError>;

/// Errors that can occur during feature selection.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// Not enough rows or columns to fit or evaluate
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// Matrix and target or feature names disagree in size
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Factor column still holds missing values
    #[error("Factor {feature} has {count} missing values; clean the panel first")]
    MissingValues {
        /// Factor name
        feature: String,
        /// Number of missing entries
        count: usize,
    },

    /// Feature requested that the dataset does not have
    #[error("Unknown feature: {0}")]
    UnknownFeature(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Storage or schema error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
