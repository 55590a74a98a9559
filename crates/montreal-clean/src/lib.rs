#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/montreal/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cleaner;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod impute;
pub mod normalize;

pub use cleaner::{CleanOutcome, CleanReport, PanelCleaner, clean};
pub use config::CleanConfig;
pub use diagnostics::{CoverageBucket, coverage_histogram, missing_counts, zero_counts};
pub use error::{CleanError, Result};
