//! Native estimators used by the selection strategies.
//!
//! - [`BoostingConfig`] / [`BoostedTrees`]: histogram gradient-boosted regression
//!   trees under squared loss, with total-gain feature importances
//! - [`ElasticNet`] / [`ElasticNetCv`]: coordinate-descent elastic net, with the
//!   penalty chosen by k-fold cross-validation
//! - [`BoostingGrid`]: k-fold grid search over boosted-tree hyperparameters

pub mod boosting;
pub mod grid;
pub mod linear;
mod tree;

pub use boosting::{BoostedTrees, BoostingConfig};
pub use grid::{BoostingGrid, GridScore};
pub use linear::{ElasticNet, ElasticNetCv, LinearFit, alpha_max, alpha_path};
