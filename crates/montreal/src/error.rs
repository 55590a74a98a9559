//! Pipeline error type.

use montreal_clean::CleanError;
use montreal_data::DataError;
use montreal_output::{ExportError, HoldingsError, ReportError};
use montreal_portfolio::PortfolioError;
use montreal_selection::SelectionError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Any failure of a pipeline stage. Every variant aborts the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading, writing or validating a table
    #[error(transparent)]
    Data(#[from] DataError),

    /// Cleaning left nothing usable or was misconfigured
    #[error(transparent)]
    Clean(#[from] CleanError),

    /// Feature selection failed
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// Portfolio construction or evaluation failed
    #[error(transparent)]
    Portfolio(#[from] PortfolioError),

    /// Report generation failed
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Holdings summary failed
    #[error(transparent)]
    Holdings(#[from] HoldingsError),

    /// Export failed
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration could not be written
    #[error("Config serialization error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// Configuration values are inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error on a specific path
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The external prediction command could not run or failed
    #[error("External prediction stage failed: {reason}")]
    ExternalStage {
        /// What went wrong
        reason: String,
    },

    /// The external prediction command wrote an unexpected file
    #[error("External prediction output has wrong columns: expected {expected:?}, found {actual:?}")]
    ExternalSchema {
        /// Columns required
        expected: Vec<String>,
        /// Columns present
        actual: Vec<String>,
    },
}

impl PipelineError {
    /// Wrap an IO error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
