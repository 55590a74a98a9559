#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/montreal/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod factor_list;
pub mod market;
pub mod panel;
pub mod schema;
pub mod store;

pub use error::{DataError, Result};
pub use factor_list::FactorList;
pub use market::{load_benchmark, load_predictions, with_calendar_columns};
pub use panel::Panel;
pub use store::{
    PanelFiles, load_factor_list, load_panel, read_table, save_factor_list, save_panel,
    write_table,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
