//! Error types for portfolio construction and evaluation.

use montreal_data::DataError;
use thiserror::Error;

/// Result type for portfolio operations.
pub type Result<T> = std::result::Result<T, PortfolioError>;

/// Errors that can occur while building or evaluating a portfolio.
#[derive(Debug, Error)]
pub enum PortfolioError {
    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A series needed for a statistic has no rows
    #[error("Empty series: {0}")]
    EmptySeries(String),

    /// Too few observations for a statistic
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// No portfolio size in the range produced a defined Sharpe ratio
    #[error("No portfolio size in [{low}, {high}] has a defined Sharpe ratio")]
    NoDefinedSharpe {
        /// Lower bound of the search
        low: usize,
        /// Upper bound of the search
        high: usize,
    },

    /// Storage or schema error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
