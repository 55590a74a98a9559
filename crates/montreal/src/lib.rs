#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/montreal/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod external;
pub mod pipeline;

// Re-export the stage crates
pub use montreal_clean as clean;
pub use montreal_data as data;
pub use montreal_output as output;
pub use montreal_portfolio as portfolio;
pub use montreal_selection as selection;

pub use config::{CONFIG_FILE, MontrealConfig, PREDICTIONS_FILE, PathsConfig, PredictionConfig};
pub use error::{PipelineError, Result};
pub use external::{render_args, run_prediction, template_vars, validate_predictions};
pub use pipeline::{Diagnostics, EvaluationOutcome, Pipeline, ReportFiles, RunSummary, Stage};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
