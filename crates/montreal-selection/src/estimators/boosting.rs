//! Gradient-boosted regression trees under squared loss.

use super::tree::{BinnedMatrix, Growth, Tree, TreeParams};
use crate::error::{Result, SelectionError};
use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};

/// Hyperparameters of a boosted tree ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingConfig {
    /// Number of boosting rounds (default: 100)
    pub n_estimators: usize,
    /// Shrinkage applied to every tree (default: 0.3)
    pub learning_rate: f64,
    /// Maximum tree depth (default: 6)
    pub max_depth: usize,
    /// Fraction of rows sampled per tree (default: 1.0)
    pub subsample: f64,
    /// Fraction of columns sampled per tree (default: 1.0)
    pub colsample_bytree: f64,
    /// L2 penalty on leaf values (default: 1.0)
    pub lambda: f64,
    /// Minimum hessian sum per child (default: 1.0)
    pub min_child_weight: f64,
    /// Histogram bins per feature (default: 256)
    pub max_bins: usize,
    /// Seed for row and column sampling (default: 42)
    pub seed: u64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.3,
            max_depth: 6,
            subsample: 1.0,
            colsample_bytree: 1.0,
            lambda: 1.0,
            min_child_weight: 1.0,
            max_bins: 256,
            seed: 42,
        }
    }
}

impl BoostingConfig {
    /// The large model used by deep elimination and path comparison:
    /// 500 trees, learning rate 0.1, 80% row and column sampling.
    pub fn large() -> Self {
        Self {
            n_estimators: 500,
            learning_rate: 0.1,
            subsample: 0.8,
            colsample_bytree: 0.8,
            ..Default::default()
        }
    }

    /// Copy with a different round count and learning rate.
    pub const fn with_rounds(mut self, n_estimators: usize, learning_rate: f64) -> Self {
        self.n_estimators = n_estimators;
        self.learning_rate = learning_rate;
        self
    }

    /// Check the parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(SelectionError::InvalidParameter(
                "n_estimators must be positive".into(),
            ));
        }
        if !(self.learning_rate > 0.0) {
            return Err(SelectionError::InvalidParameter(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        for (name, value) in [
            ("subsample", self.subsample),
            ("colsample_bytree", self.colsample_bytree),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(SelectionError::InvalidParameter(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Fit an ensemble on `x` and `y`.
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<BoostedTrees> {
        self.validate()?;
        let (n, p) = x.dim();
        if n == 0 || p == 0 {
            return Err(SelectionError::EmptyDataset(format!(
                "cannot fit boosted trees on a {n}x{p} matrix"
            )));
        }
        if y.len() != n {
            return Err(SelectionError::DimensionMismatch {
                expected: n,
                actual: y.len(),
            });
        }

        let binned = BinnedMatrix::new(x.view(), self.max_bins);
        let params = TreeParams {
            max_depth: self.max_depth,
            lambda: self.lambda,
            min_child_weight: self.min_child_weight,
        };
        let n_rows = sample_size(n, self.subsample);
        let n_cols = sample_size(p, self.colsample_bytree);
        let mut rng = StdRng::seed_from_u64(self.seed);

        let base_score = y.sum() / n as f64;
        let mut prediction = vec![base_score; n];
        let mut grad = vec![0.0; n];
        let hess = vec![1.0; n];
        let mut gains = vec![0.0; p];
        let mut trees = Vec::with_capacity(self.n_estimators);

        for _ in 0..self.n_estimators {
            for i in 0..n {
                grad[i] = prediction[i] - y[i];
            }
            let rows = draw(&mut rng, n, n_rows);
            let columns = draw(&mut rng, p, n_cols);

            let growth = Growth {
                binned: &binned,
                grad: &grad,
                hess: &hess,
                params,
                shrinkage: self.learning_rate,
            };
            let tree = growth.tree(rows, &columns, &mut gains);
            for (i, row) in x.axis_iter(Axis(0)).enumerate() {
                prediction[i] += tree.predict_row(row);
            }
            trees.push(tree);
        }

        Ok(BoostedTrees {
            base_score,
            trees,
            gains: Array1::from(gains),
        })
    }
}

fn sample_size(total: usize, fraction: f64) -> usize {
    ((total as f64 * fraction).round() as usize).clamp(1, total)
}

/// Sorted sample of `amount` indices out of `0..total`; all of them when `amount == total`.
fn draw(rng: &mut StdRng, total: usize, amount: usize) -> Vec<usize> {
    if amount >= total {
        return (0..total).collect();
    }
    let mut picked = sample(rng, total, amount).into_vec();
    picked.sort_unstable();
    picked
}

/// A fitted boosted tree ensemble.
#[derive(Debug, Clone)]
pub struct BoostedTrees {
    base_score: f64,
    trees: Vec<Tree>,
    gains: Array1<f64>,
}

impl BoostedTrees {
    /// Predict every row of `x`.
    pub fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        x.axis_iter(Axis(0))
            .map(|row| {
                self.base_score + self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
            })
            .collect()
    }

    /// Total split gain per input column.
    pub const fn importances(&self) -> &Array1<f64> {
        &self.gains
    }

    /// Number of fitted trees.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{mse, r2};
    use approx::assert_relative_eq;

    fn signal(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 3), |(i, j)| match j {
            0 => (i as f64 / n as f64) * 2.0 - 1.0,
            1 => ((i * 7919) % 101) as f64 / 101.0,
            _ => 0.5,
        });
        let y = x.column(0).mapv(|v| 3.0 * v);
        (x, y)
    }

    #[test]
    fn test_fit_learns_single_feature_signal() {
        let (x, y) = signal(200);
        let model = BoostingConfig::default().fit(&x, &y).unwrap();
        let predicted = model.predict(&x);
        assert!(r2(y.view(), predicted.view()) > 0.95);
        assert!(mse(y.view(), predicted.view()) < 0.1);

        let gains = model.importances();
        assert!(gains[0] > gains[1]);
        assert_eq!(gains[2], 0.0);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = signal(120);
        let config = BoostingConfig::large().with_rounds(20, 0.1);
        let a = config.fit(&x, &y).unwrap().predict(&x);
        let b = config.fit(&x, &y).unwrap().predict(&x);
        assert_eq!(a, b);
    }

    #[test]
    fn test_constant_target_predicts_mean() {
        let (x, _) = signal(50);
        let y = Array1::from_elem(50, 0.25);
        let model = BoostingConfig::default().with_rounds(5, 0.1).fit(&x, &y).unwrap();
        for value in model.predict(&x) {
            assert_relative_eq!(value, 0.25);
        }
        assert_eq!(model.n_trees(), 5);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let (x, y) = signal(10);
        let config = BoostingConfig {
            subsample: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.fit(&x, &y), Err(SelectionError::InvalidParameter(_))));
        let empty = Array2::<f64>::zeros((0, 3));
        assert!(matches!(
            BoostingConfig::default().fit(&empty, &Array1::zeros(0)),
            Err(SelectionError::EmptyDataset(_))
        ));
    }
}
