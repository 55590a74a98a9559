//! Cross-validated grid search over boosted-tree hyperparameters.

use super::boosting::BoostingConfig;
use crate::dataset::k_fold;
use crate::error::{Result, SelectionError};
use crate::metrics::mse;
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Grid of (`n_estimators`, `learning_rate`) pairs scored by k-fold MSE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingGrid {
    /// Base configuration; only rounds and learning rate vary
    pub base: BoostingConfig,
    /// Candidate round counts (default: 5, 10)
    pub n_estimators: Vec<usize>,
    /// Candidate learning rates (default: 0.01, 0.1, 0.2)
    pub learning_rates: Vec<f64>,
    /// Number of folds (default: 5)
    pub folds: usize,
}

impl Default for BoostingGrid {
    fn default() -> Self {
        Self {
            base: BoostingConfig::default(),
            n_estimators: vec![5, 10],
            learning_rates: vec![0.01, 0.1, 0.2],
            folds: 5,
        }
    }
}

/// One scored grid point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridScore {
    /// Configuration evaluated
    pub config: BoostingConfig,
    /// Mean validation MSE over the folds
    pub mse: f64,
}

impl BoostingGrid {
    /// Every configuration of the grid, rounds-major.
    pub fn candidates(&self) -> Vec<BoostingConfig> {
        self.n_estimators
            .iter()
            .flat_map(|&n| {
                self.learning_rates
                    .iter()
                    .map(move |&lr| self.base.with_rounds(n, lr))
            })
            .collect()
    }

    /// Score every grid point; folds and points run on the rayon pool.
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Vec<GridScore>> {
        let candidates = self.candidates();
        if candidates.is_empty() {
            return Err(SelectionError::InvalidParameter("empty hyperparameter grid".into()));
        }
        let folds = k_fold(x.nrows(), self.folds)?;

        let jobs: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|c| (0..folds.len()).map(move |f| (c, f)))
            .collect();
        let errors: Vec<f64> = jobs
            .par_iter()
            .map(|&(c, f)| {
                let (train, validation) = &folds[f];
                let model = candidates[c].fit(
                    &x.select(Axis(0), train),
                    &y.select(Axis(0), train),
                )?;
                let predicted = model.predict(&x.select(Axis(0), validation));
                Ok(mse(y.select(Axis(0), validation).view(), predicted.view()))
            })
            .collect::<Result<_>>()?;

        Ok(candidates
            .into_iter()
            .enumerate()
            .map(|(c, config)| {
                let fold_errors = &errors[c * folds.len()..(c + 1) * folds.len()];
                GridScore {
                    config,
                    mse: fold_errors.iter().sum::<f64>() / fold_errors.len() as f64,
                }
            })
            .collect())
    }

    /// Lowest mean MSE; ties keep the earlier grid point.
    pub fn best(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<BoostingConfig> {
        let scores = self.score(x, y)?;
        let best = scores
            .iter()
            .fold(None::<&GridScore>, |best, s| match best {
                Some(b) if b.mse <= s.mse => Some(b),
                _ => Some(s),
            })
            .ok_or_else(|| SelectionError::InvalidParameter("empty hyperparameter grid".into()))?;
        debug!(
            n_estimators = best.config.n_estimators,
            learning_rate = best.config.learning_rate,
            cv_mse = best.mse,
            "Grid search best configuration"
        );
        Ok(best.config)
    }
}
