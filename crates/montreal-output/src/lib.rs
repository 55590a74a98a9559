#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/montreal/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod holdings;
pub mod report;

pub use export::{ExportError, ExportFormat, Exporter};
pub use holdings::{Holding, HoldingsError, top_holdings};
pub use report::{PerformanceReport, ReportError};
