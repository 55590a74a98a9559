#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/montreal/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod construct;
pub mod engine;
pub mod error;
pub mod performance;
pub mod search;

pub use config::PortfolioConfig;
pub use construct::{POSITION, build_portfolio, filter_window, split_counts};
pub use engine::{Evaluation, PortfolioEngine};
pub use error::{PortfolioError, Result};
pub use performance::{
    BENCHMARK_RETURN, CUMULATIVE_BENCHMARK, CUMULATIVE_PORTFOLIO, PerformanceStats,
    WEIGHTED_RETURN, annualized_return, annualized_std, cumulative_series, sharpe, sharpe_ratio,
    weighted_return,
};
pub use search::{SizeScore, SizeSearch, best_score, search_best_size};
