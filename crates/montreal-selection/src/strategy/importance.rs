//! Embedded strategy: rank by boosted-tree split gain.

use super::{DEFAULT_K, FeatureSelector, top_k};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::estimators::BoostingGrid;

/// Grid-search a boosted ensemble, then keep the top-k features by total gain.
#[derive(Debug, Clone, Default)]
pub struct ImportanceSelector {
    /// Hyperparameter grid searched before the final fit
    pub grid: BoostingGrid,
}

impl ImportanceSelector {
    /// Total gain per column of the best grid model fitted on all rows.
    pub fn importances(&self, data: &Dataset) -> Result<Vec<f64>> {
        let config = self.grid.best(&data.x, &data.y)?;
        let model = config.fit(&data.x, &data.y)?;
        Ok(model.importances().to_vec())
    }
}

impl FeatureSelector for ImportanceSelector {
    fn name(&self) -> &str {
        "Boosted Importance"
    }

    fn select(&self, data: &Dataset, k: Option<usize>) -> Result<Vec<String>> {
        let importances = self.importances(data)?;
        Ok(top_k(&data.features, &importances, k.unwrap_or(DEFAULT_K)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_signal_column_ranks_first() {
        let x = Array2::from_shape_fn((80, 3), |(i, j)| match j {
            0 => ((i * 13) % 7) as f64,
            1 => i as f64 / 80.0,
            _ => ((i * 5) % 3) as f64,
        });
        let y = x.column(1).mapv(|v| (6.0 * v).sin());
        let data = Dataset::new(x, y, vec!["a".into(), "signal".into(), "c".into()]).unwrap();

        let picked = ImportanceSelector::default().select(&data, Some(1)).unwrap();
        assert_eq!(picked, vec!["signal"]);
    }
}
