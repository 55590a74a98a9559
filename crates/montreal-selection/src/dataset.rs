//! Matrix view of a panel: factors as `x`, excess return as `y`.

use crate::error::{Result, SelectionError};
use montreal_data::schema::TARGET;
use montreal_data::{FactorList, Panel};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Design matrix with its target and column names.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Rows are entity-months, columns follow `features`
    pub x: Array2<f64>,
    /// Target (`stock_exret`)
    pub y: Array1<f64>,
    /// Column names of `x`
    pub features: Vec<String>,
}

impl Dataset {
    /// Build from raw arrays, checking that the shapes agree.
    pub fn new(x: Array2<f64>, y: Array1<f64>, features: Vec<String>) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(SelectionError::DimensionMismatch {
                expected: x.nrows(),
                actual: y.len(),
            });
        }
        if x.ncols() != features.len() {
            return Err(SelectionError::DimensionMismatch {
                expected: x.ncols(),
                actual: features.len(),
            });
        }
        Ok(Self { x, y, features })
    }

    /// Extract the factor columns of `factors` and the target from `panel`.
    ///
    /// Factors must be free of missing values, which holds for cleaned panels.
    pub fn from_panel(panel: &Panel, factors: &FactorList) -> Result<Self> {
        let frame = panel.frame();
        factors.ensure_columns_of(frame)?;

        let n = frame.height();
        let mut x = Array2::<f64>::zeros((n, factors.len()));
        for (j, name) in factors.iter().enumerate() {
            x.column_mut(j).assign(&float_column(frame, name)?);
        }
        let y = float_column(frame, TARGET)?;

        Self::new(x, y, factors.names().to_vec())
    }

    /// Number of rows.
    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    /// Number of feature columns.
    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Position of a feature column.
    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| f == name)
    }

    /// Keep only the named columns, in the given order.
    pub fn subset(&self, names: &[String]) -> Result<Self> {
        let indices = names
            .iter()
            .map(|name| {
                self.feature_index(name)
                    .ok_or_else(|| SelectionError::UnknownFeature(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.columns(&indices))
    }

    /// Keep only the columns at `indices`.
    pub fn columns(&self, indices: &[usize]) -> Self {
        Self {
            x: self.x.select(Axis(1), indices),
            y: self.y.clone(),
            features: indices.iter().map(|&j| self.features[j].clone()).collect(),
        }
    }

    /// Keep only the rows at `indices`.
    pub fn rows(&self, indices: &[usize]) -> Self {
        Self {
            x: self.x.select(Axis(0), indices),
            y: self.y.select(Axis(0), indices),
            features: self.features.clone(),
        }
    }

    /// Seeded shuffled split; the test part takes `ceil(n * test_fraction)` rows.
    pub fn train_test_split(&self, test_fraction: f64, seed: u64) -> Result<(Self, Self)> {
        let (train, test) = split_indices(self.n_samples(), test_fraction, seed)?;
        Ok((self.rows(&train), self.rows(&test)))
    }
}

/// Shuffle `0..n` with `seed` and cut off a test part.
pub fn split_indices(n: usize, test_fraction: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(SelectionError::InvalidParameter(format!(
            "test_fraction must be in (0, 1), got {test_fraction}"
        )));
    }
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(SelectionError::EmptyDataset(format!(
            "{n} rows cannot be split with test_fraction {test_fraction}"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let train = indices.split_off(n_test);
    Ok((train, indices))
}

/// Contiguous, unshuffled k-fold partition of `0..n` as (train, validation) pairs.
///
/// The first `n % k` folds take one extra row.
pub fn k_fold(n: usize, k: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
    if k < 2 || k > n {
        return Err(SelectionError::InvalidParameter(format!(
            "cannot build {k} folds over {n} rows"
        )));
    }
    let base = n / k;
    let extra = n % k;

    let mut folds = Vec::with_capacity(k);
    let mut start = 0;
    for fold in 0..k {
        let size = base + usize::from(fold < extra);
        let end = start + size;
        let validation: Vec<usize> = (start..end).collect();
        let train: Vec<usize> = (0..start).chain(end..n).collect();
        folds.push((train, validation));
        start = end;
    }
    Ok(folds)
}

fn float_column(frame: &DataFrame, name: &str) -> Result<Array1<f64>> {
    let column = frame.column(name)?.cast(&DataType::Float64)?;
    let values = column.f64()?;
    let missing = values.null_count();
    if missing > 0 {
        return Err(SelectionError::MissingValues {
            feature: name.to_string(),
            count: missing,
        });
    }
    Ok(values.into_no_null_iter().collect())
}
