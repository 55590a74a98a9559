//! Wrapper strategy: recursive feature elimination on boosted-tree importances.

use super::{DEFAULT_K, FeatureSelector};
use crate::dataset::Dataset;
use crate::error::{Result, SelectionError};
use crate::estimators::{BoostingConfig, BoostingGrid};
use ndarray::Axis;
use tracing::debug;

/// Estimator refitted at every elimination round.
#[derive(Debug, Clone, PartialEq)]
pub enum EliminationModel {
    /// Grid-search once on all features, then reuse the winning configuration
    Tuned(BoostingGrid),
    /// Use this configuration as is
    Fixed(BoostingConfig),
}

impl Default for EliminationModel {
    fn default() -> Self {
        Self::Tuned(BoostingGrid::default())
    }
}

/// Refit, drop the `step` least important features, repeat until `k` remain.
#[derive(Debug, Clone, PartialEq)]
pub struct RecursiveElimination {
    /// Estimator to refit
    pub model: EliminationModel,
    /// Features removed per round (default: 1)
    pub step: usize,
}

impl Default for RecursiveElimination {
    fn default() -> Self {
        Self {
            model: EliminationModel::default(),
            step: 1,
        }
    }
}

impl RecursiveElimination {
    /// Fixed estimator with a custom step.
    pub const fn fixed(config: BoostingConfig, step: usize) -> Self {
        Self {
            model: EliminationModel::Fixed(config),
            step,
        }
    }

    /// Column indices that survive elimination down to `k`, in column order.
    pub fn support(&self, data: &Dataset, k: usize) -> Result<Vec<usize>> {
        if self.step == 0 {
            return Err(SelectionError::InvalidParameter("step must be positive".into()));
        }
        if k == 0 {
            return Err(SelectionError::InvalidParameter(
                "cannot eliminate down to zero features".into(),
            ));
        }
        if data.n_features() <= k {
            return Ok((0..data.n_features()).collect());
        }
        let config = match &self.model {
            EliminationModel::Tuned(grid) => grid.best(&data.x, &data.y)?,
            EliminationModel::Fixed(config) => *config,
        };

        let mut remaining: Vec<usize> = (0..data.n_features()).collect();
        let mut round = 0;
        while remaining.len() > k {
            let x = data.x.select(Axis(1), &remaining);
            let model = config.fit(&x, &data.y)?;
            let importances = model.importances();

            // least important first; on ties the later column goes first
            let mut order: Vec<usize> = (0..remaining.len()).collect();
            order.sort_by(|&a, &b| importances[a].total_cmp(&importances[b]).then(b.cmp(&a)));

            let drop = self.step.min(remaining.len() - k);
            let mut dropped: Vec<usize> = order[..drop].to_vec();
            dropped.sort_unstable();
            for position in dropped.into_iter().rev() {
                remaining.remove(position);
            }
            round += 1;
            debug!(round, remaining = remaining.len(), "Elimination round");
        }
        Ok(remaining)
    }
}

impl FeatureSelector for RecursiveElimination {
    fn name(&self) -> &str {
        "Recursive Elimination"
    }

    fn select(&self, data: &Dataset, k: Option<usize>) -> Result<Vec<String>> {
        let support = self.support(data, k.unwrap_or(DEFAULT_K))?;
        Ok(support.into_iter().map(|j| data.features[j].clone()).collect())
    }
}
