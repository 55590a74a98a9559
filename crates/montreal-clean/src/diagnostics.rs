//! Exploratory counts used to choose the cleaning thresholds.

use crate::error::Result;
use crate::filter::factor_counts;
use montreal_data::schema::{DATE, ENTITY};
use polars::prelude::*;

/// Number of entities sharing the same count of available months.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageBucket {
    /// Distinct dates available for an entity
    pub months: usize,
    /// Entities with exactly that many months
    pub entities: usize,
}

/// Factors with at least one missing (null or NaN) value, most missing first.
pub fn missing_counts(frame: &DataFrame, factors: &[String]) -> Result<Vec<(String, usize)>> {
    let mut counts: Vec<(String, usize)> = factor_counts(frame, factors)?
        .into_iter()
        .filter(|c| c.missing > 0)
        .map(|c| (c.factor, c.missing))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(counts)
}

/// Factors with at least one exactly-zero value, most zeros first.
pub fn zero_counts(frame: &DataFrame, factors: &[String]) -> Result<Vec<(String, usize)>> {
    let mut counts: Vec<(String, usize)> = factor_counts(frame, factors)?
        .into_iter()
        .filter(|c| c.zeros > 0)
        .map(|c| (c.factor, c.zeros))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(counts)
}

/// How many entities have each count of available months, longest coverage first.
pub fn coverage_histogram(frame: &DataFrame) -> Result<Vec<CoverageBucket>> {
    let histogram = frame
        .clone()
        .lazy()
        .group_by([col(ENTITY)])
        .agg([col(DATE).n_unique().alias("months")])
        .group_by([col("months")])
        .agg([col(ENTITY).count().alias("entities")])
        .sort(
            ["months"],
            SortMultipleOptions::default().with_order_descending(true),
        )
        .collect()?;

    let months = histogram.column("months")?.cast(&DataType::UInt64)?;
    let entities = histogram.column("entities")?.cast(&DataType::UInt64)?;
    Ok(months
        .u64()?
        .into_no_null_iter()
        .zip(entities.u64()?.into_no_null_iter())
        .map(|(m, e)| CoverageBucket {
            months: m as usize,
            entities: e as usize,
        })
        .collect())
}
