//! Error types for tabular storage.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors raised while reading, writing or validating tables.
///
/// All of these are fatal for a pipeline run: the inputs are static files and
/// nothing is retried.
#[derive(Debug, Error)]
pub enum DataError {
    /// IO error on a specific file
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Required columns are absent
    #[error("Missing columns {missing:?}: expected {expected:?}, found {actual:?}")]
    MissingColumns {
        /// Columns that were not found
        missing: Vec<String>,
        /// Columns the caller asked for
        expected: Vec<String>,
        /// Columns present in the table
        actual: Vec<String>,
    },

    /// Column has an unexpected type or content
    #[error("Schema error: {0}")]
    Schema(String),

    /// The (entity, date) key is not unique
    #[error("Duplicate panel key: permno={entity}, date={date}")]
    DuplicateKey {
        /// Entity id
        entity: i64,
        /// Date rendered as text
        date: String,
    },

    /// Factor list names the same factor twice
    #[error("Duplicate factor name: {0}")]
    DuplicateFactor(String),

    /// Table has no rows where rows are required
    #[error("Empty table: {0}")]
    Empty(String),
}

impl DataError {
    /// Wrap an IO error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
