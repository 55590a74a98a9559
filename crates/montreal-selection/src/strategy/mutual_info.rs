//! Filter strategy: rank by estimated mutual information with the target.

use super::{DEFAULT_K, FeatureSelector, top_k};
use crate::dataset::Dataset;
use crate::error::{Result, SelectionError};
use crate::metrics::{mutual_information, quantile_bins};
use ndarray::Axis;

/// Top-k features by plug-in mutual information on equal-frequency bins.
#[derive(Debug, Clone, Copy)]
pub struct MutualInfoSelector {
    /// Bins per variable (default: 10)
    pub bins: usize,
}

impl Default for MutualInfoSelector {
    fn default() -> Self {
        Self { bins: 10 }
    }
}

impl MutualInfoSelector {
    /// Mutual information (nats) of every column with the target.
    pub fn scores(&self, data: &Dataset) -> Result<Vec<f64>> {
        if self.bins < 2 {
            return Err(SelectionError::InvalidParameter(format!(
                "mutual information needs at least 2 bins, got {}",
                self.bins
            )));
        }
        let target = quantile_bins(data.y.view(), self.bins);
        Ok(data
            .x
            .axis_iter(Axis(1))
            .map(|column| mutual_information(&quantile_bins(column, self.bins), &target))
            .collect())
    }
}

impl FeatureSelector for MutualInfoSelector {
    fn name(&self) -> &str {
        "Mutual Information"
    }

    fn select(&self, data: &Dataset, k: Option<usize>) -> Result<Vec<String>> {
        let scores = self.scores(data)?;
        Ok(top_k(&data.features, &scores, k.unwrap_or(DEFAULT_K)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    #[test]
    fn test_dependent_feature_beats_independent_one() {
        let n = 200;
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            if j == 0 {
                i as f64
            } else {
                ((i * 37) % 11) as f64
            }
        });
        let y: Array1<f64> = (0..n).map(|i| (i as f64).powi(2)).collect();
        let data = Dataset::new(x, y, vec!["monotone".into(), "cycle".into()]).unwrap();

        let scores = MutualInfoSelector::default().scores(&data).unwrap();
        assert!(scores[0] > scores[1]);
        assert_eq!(
            MutualInfoSelector::default().select(&data, Some(1)).unwrap(),
            vec!["monotone"]
        );
    }

    #[test]
    fn test_rejects_single_bin() {
        let data = Dataset::new(Array2::zeros((3, 1)), Array1::zeros(3), vec!["a".into()]).unwrap();
        assert!(MutualInfoSelector { bins: 1 }.scores(&data).is_err());
    }
}
