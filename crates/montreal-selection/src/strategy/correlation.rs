//! Filter strategy: rank by absolute Pearson correlation with the target.

use super::{DEFAULT_K, FeatureSelector, top_k};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::metrics::pearson;
use ndarray::Axis;

/// Top-k features by |Pearson r| with the target. Zero-variance columns score 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationSelector;

impl CorrelationSelector {
    /// |r| of every column, in column order.
    pub fn scores(data: &Dataset) -> Vec<f64> {
        data.x
            .axis_iter(Axis(1))
            .map(|column| pearson(column, data.y.view()).abs())
            .collect()
    }
}

impl FeatureSelector for CorrelationSelector {
    fn name(&self) -> &str {
        "Correlation"
    }

    fn select(&self, data: &Dataset, k: Option<usize>) -> Result<Vec<String>> {
        let scores = Self::scores(data);
        Ok(top_k(&data.features, &scores, k.unwrap_or(DEFAULT_K)))
    }
}
