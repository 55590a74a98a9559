//! Error types for panel cleaning.

use montreal_data::DataError;
use thiserror::Error;

/// Result type for cleaning operations.
pub type Result<T> = std::result::Result<T, CleanError>;

/// Errors that can occur while cleaning a panel.
#[derive(Debug, Error)]
pub enum CleanError {
    /// No factor met both the missing and zero thresholds
    #[error("No factor survived filtering ({candidates} candidates)")]
    NoFactors {
        /// Number of factors considered
        candidates: usize,
    },

    /// Every entity was filtered out
    #[error("No entity survived the {stage} filter")]
    NoEntities {
        /// Filter that removed the last entity
        stage: &'static str,
    },

    /// Threshold outside its valid range
    #[error("Invalid {name}: {value} (must be in (0, 1])")]
    InvalidThreshold {
        /// Threshold name
        name: &'static str,
        /// Offending value
        value: f64,
    },

    /// Storage or schema error
    #[error(transparent)]
    Data(#[from] DataError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
