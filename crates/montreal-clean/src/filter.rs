//! Factor and stock filters.
//!
//! Factor survivorship is decided once, on the full input panel. The stock
//! filters then run on the surviving factors only, completeness first and
//! coverage second.

use crate::error::Result;
use montreal_data::schema::{DATE, ENTITY};
use polars::prelude::*;

/// Missing and zero tallies of one factor column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactorCounts {
    /// Factor name
    pub factor: String,
    /// Number of missing entries
    pub missing: usize,
    /// Number of entries exactly equal to zero
    pub zeros: usize,
}

/// Count missing (null or NaN) and exactly-zero entries of each factor over every row.
pub fn factor_counts(frame: &DataFrame, factors: &[String]) -> Result<Vec<FactorCounts>> {
    factors
        .iter()
        .map(|factor| {
            let values = frame.column(factor)?.cast(&DataType::Float64)?;
            let values = values.f64()?;
            let zeros = values.into_iter().filter(|v| *v == Some(0.0)).count();
            let missing = values
                .into_iter()
                .filter(|v| v.is_none_or(f64::is_nan))
                .count();
            Ok(FactorCounts {
                factor: factor.clone(),
                missing,
                zeros,
            })
        })
        .collect()
}

/// Factors whose missing count is below `missing_threshold * rows` and whose
/// zero count is below `zero_threshold * rows`, in input order.
pub fn select_factors(
    counts: &[FactorCounts],
    rows: usize,
    missing_threshold: f64,
    zero_threshold: f64,
) -> Vec<String> {
    let rows = rows as f64;
    counts
        .iter()
        .filter(|c| (c.missing as f64) < rows * missing_threshold)
        .filter(|c| (c.zeros as f64) < rows * zero_threshold)
        .map(|c| c.factor.clone())
        .collect()
}

/// Drop every entity for which some factor is missing on all of its rows.
pub fn drop_incomplete_entities(data: LazyFrame, factors: &[String]) -> LazyFrame {
    let observed = factors
        .iter()
        .map(|f| {
            col(f.as_str())
                .is_not_null()
                .sum()
                .over([col(ENTITY)])
                .gt(lit(0))
        })
        .reduce(|acc, e| acc.and(e));

    match observed {
        Some(predicate) => data.filter(predicate),
        None => data,
    }
}

/// Keep entities with at least `months_threshold` distinct dates.
pub fn keep_covered_entities(data: LazyFrame, months_threshold: usize) -> LazyFrame {
    let threshold = u32::try_from(months_threshold).unwrap_or(u32::MAX);
    data.filter(
        col(DATE)
            .n_unique()
            .over([col(ENTITY)])
            .gt_eq(lit(threshold)),
    )
}
