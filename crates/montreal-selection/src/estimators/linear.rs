//! Elastic net regression by cyclic coordinate descent.
//!
//! Minimizes
//!
//! ```text
//! 1/(2n) ||y - Xw - b||² + alpha * l1_ratio * ||w||₁ + alpha * (1 - l1_ratio) / 2 * ||w||²
//! ```
//!
//! `l1_ratio = 1` is the Lasso. Penalty strength is chosen by k-fold
//! cross-validation over a geometric alpha path.

use crate::dataset::k_fold;
use crate::error::{Result, SelectionError};
use crate::metrics::mse;
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use tracing::debug;

/// A fitted linear model.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    /// Coefficients, one per column
    pub coefficients: Array1<f64>,
    /// Intercept
    pub intercept: f64,
    /// Penalty strength used
    pub alpha: f64,
    /// L1 share of the penalty used
    pub l1_ratio: f64,
}

impl LinearFit {
    /// Predict every row of `x`.
    pub fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        x.dot(&self.coefficients) + self.intercept
    }

    /// Indices of the nonzero coefficients.
    pub fn support(&self) -> Vec<usize> {
        self.coefficients
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != 0.0)
            .map(|(j, _)| j)
            .collect()
    }
}

/// Coordinate descent settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElasticNet {
    /// Penalty strength
    pub alpha: f64,
    /// L1 share of the penalty, in (0, 1]
    pub l1_ratio: f64,
    /// Maximum passes over the coordinates
    pub max_iter: usize,
    /// Stop when the largest coefficient update falls below this
    pub tol: f64,
}

impl ElasticNet {
    /// Defaults: 1000 passes, tolerance 1e-4.
    pub const fn new(alpha: f64, l1_ratio: f64) -> Self {
        Self {
            alpha,
            l1_ratio,
            max_iter: 1000,
            tol: 1e-4,
        }
    }

    /// Fit on `x`, `y` with an unpenalized intercept.
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<LinearFit> {
        self.fit_from(x, y, None)
    }

    fn fit_from(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        warm: Option<&Array1<f64>>,
    ) -> Result<LinearFit> {
        check_l1_ratio(self.l1_ratio)?;
        let (n, p) = x.dim();
        if n == 0 || p == 0 {
            return Err(SelectionError::EmptyDataset(format!(
                "cannot fit a linear model on a {n}x{p} matrix"
            )));
        }
        if y.len() != n {
            return Err(SelectionError::DimensionMismatch {
                expected: n,
                actual: y.len(),
            });
        }

        let nf = n as f64;
        let x_mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(p));
        let y_mean = y.sum() / nf;
        let xc = x - &x_mean.view().insert_axis(Axis(0));
        let yc = y - y_mean;

        let norms: Array1<f64> = xc.axis_iter(Axis(1)).map(|c| c.dot(&c) / nf).collect();
        let l1 = self.alpha * self.l1_ratio;
        let l2 = self.alpha * (1.0 - self.l1_ratio);

        let mut w = warm.cloned().unwrap_or_else(|| Array1::zeros(p));
        let mut residual = &yc - &xc.dot(&w);

        for pass in 0..self.max_iter {
            let mut max_step: f64 = 0.0;
            for j in 0..p {
                if norms[j] == 0.0 {
                    w[j] = 0.0;
                    continue;
                }
                let column = xc.column(j);
                let old = w[j];
                let rho = column.dot(&residual) / nf + norms[j] * old;
                let new = soft_threshold(rho, l1) / (norms[j] + l2);
                if new != old {
                    residual.scaled_add(old - new, &column);
                    w[j] = new;
                    max_step = max_step.max((new - old).abs());
                }
            }
            if max_step < self.tol {
                debug!(passes = pass + 1, alpha = self.alpha, "Coordinate descent converged");
                break;
            }
        }

        let intercept = y_mean - x_mean.dot(&w);
        Ok(LinearFit {
            coefficients: w,
            intercept,
            alpha: self.alpha,
            l1_ratio: self.l1_ratio,
        })
    }
}

fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

fn check_l1_ratio(l1_ratio: f64) -> Result<()> {
    if l1_ratio > 0.0 && l1_ratio <= 1.0 {
        Ok(())
    } else {
        Err(SelectionError::InvalidParameter(format!(
            "l1_ratio must be in (0, 1], got {l1_ratio}"
        )))
    }
}

/// Smallest alpha that zeroes every coefficient, for the given `l1_ratio`.
pub fn alpha_max(x: &Array2<f64>, y: &Array1<f64>, l1_ratio: f64) -> f64 {
    let n = x.nrows().max(1) as f64;
    let x_mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(x.ncols()));
    let y_mean = y.sum() / n;
    let yc = y - y_mean;
    x.axis_iter(Axis(1))
        .zip(x_mean.iter())
        .map(|(c, m)| ((&c - *m).dot(&yc) / n).abs())
        .fold(0.0, f64::max)
        / l1_ratio
}

/// `n_alphas` values from `alpha_max` down to `alpha_max * eps`, geometrically spaced.
pub fn alpha_path(alpha_max: f64, n_alphas: usize, eps: f64) -> Vec<f64> {
    if alpha_max <= 0.0 || n_alphas == 0 {
        return vec![];
    }
    if n_alphas == 1 {
        return vec![alpha_max];
    }
    let step = eps.ln() / (n_alphas - 1) as f64;
    (0..n_alphas)
        .map(|i| alpha_max * (step * i as f64).exp())
        .collect()
}

/// Cross-validated elastic net over an alpha path and a list of `l1_ratio`s.
#[derive(Debug, Clone, PartialEq)]
pub struct ElasticNetCv {
    /// Candidate L1 shares
    pub l1_ratios: Vec<f64>,
    /// Fixed alphas; when empty a path is generated per `l1_ratio`
    pub alphas: Vec<f64>,
    /// Length of a generated path
    pub n_alphas: usize,
    /// Ratio of the smallest to the largest generated alpha
    pub eps: f64,
    /// Number of folds
    pub folds: usize,
}

impl Default for ElasticNetCv {
    fn default() -> Self {
        Self {
            l1_ratios: vec![1.0],
            alphas: vec![],
            n_alphas: 30,
            eps: 1e-3,
            folds: 5,
        }
    }
}

impl ElasticNetCv {
    /// Lasso: `l1_ratio = 1`.
    pub fn lasso() -> Self {
        Self::default()
    }

    /// ElasticNet over `l1_ratio` in {0.1, 0.5, 0.9, 1}.
    pub fn elastic_net() -> Self {
        Self {
            l1_ratios: vec![0.1, 0.5, 0.9, 1.0],
            ..Default::default()
        }
    }

    /// Pick (l1_ratio, alpha) by mean validation MSE and refit on all rows.
    ///
    /// Ties keep the earlier `l1_ratio` and the larger alpha.
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<LinearFit> {
        if self.l1_ratios.is_empty() {
            return Err(SelectionError::InvalidParameter(
                "at least one l1_ratio is required".into(),
            ));
        }
        let folds = k_fold(x.nrows(), self.folds)?;

        let mut best: Option<(f64, f64, f64)> = None;
        for &l1_ratio in &self.l1_ratios {
            check_l1_ratio(l1_ratio)?;
            let alphas = if self.alphas.is_empty() {
                alpha_path(alpha_max(x, y, l1_ratio), self.n_alphas, self.eps)
            } else {
                self.alphas.clone()
            };
            if alphas.is_empty() {
                // target is constant: every coefficient is zero at any alpha
                continue;
            }

            let fold_errors: Vec<Vec<f64>> = folds
                .par_iter()
                .map(|(train, validation)| {
                    path_errors(x, y, train, validation, &alphas, l1_ratio)
                })
                .collect::<Result<_>>()?;

            for (a, &alpha) in alphas.iter().enumerate() {
                let error =
                    fold_errors.iter().map(|e| e[a]).sum::<f64>() / fold_errors.len() as f64;
                if best.is_none_or(|(_, _, e)| error < e) {
                    best = Some((l1_ratio, alpha, error));
                }
            }
        }

        let (l1_ratio, alpha, error) = best.unwrap_or((self.l1_ratios[0], f64::MAX, f64::NAN));
        debug!(l1_ratio, alpha, cv_mse = error, "Elastic net penalty chosen");
        ElasticNet::new(alpha, l1_ratio).fit(x, y)
    }
}

/// Validation MSE of every alpha on one fold, warm-starting down the path.
fn path_errors(
    x: &Array2<f64>,
    y: &Array1<f64>,
    train: &[usize],
    validation: &[usize],
    alphas: &[f64],
    l1_ratio: f64,
) -> Result<Vec<f64>> {
    let x_train = x.select(Axis(0), train);
    let y_train = y.select(Axis(0), train);
    let x_valid = x.select(Axis(0), validation);
    let y_valid = y.select(Axis(0), validation);

    let mut warm: Option<Array1<f64>> = None;
    let mut errors = Vec::with_capacity(alphas.len());
    for &alpha in alphas {
        let fit = ElasticNet::new(alpha, l1_ratio).fit_from(&x_train, &y_train, warm.as_ref())?;
        errors.push(mse(y_valid.view(), fit.predict(&x_valid).view()));
        warm = Some(fit.coefficients);
    }
    Ok(errors)
}
