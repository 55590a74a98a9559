//! Monthly performance series and the statistics derived from it.

use crate::construct::POSITION;
use crate::error::{PortfolioError, Result};
use montreal_data::schema::{DATE, MONTH, TARGET, YEAR, require_columns};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Mean of `stock_exret * position` per month.
pub const WEIGHTED_RETURN: &str = "weighted_return";
/// Benchmark return after joining on (year, month).
pub const BENCHMARK_RETURN: &str = "benchmark_return";
/// Running product of `1 + weighted_return`.
pub const CUMULATIVE_PORTFOLIO: &str = "cumulative_portfolio";
/// Running product of `1 + benchmark_return`.
pub const CUMULATIVE_BENCHMARK: &str = "cumulative_benchmark";

const MONTHS_PER_YEAR: f64 = 12.0;
/// Deviations at or below this share of `max(|mean|, 1)` are rounding residue.
const STD_TOLERANCE: f64 = 1e-12;

/// One row per (year, month, date) with the equal-weighted signed return, sorted by date.
pub fn weighted_return(portfolio: &DataFrame) -> Result<DataFrame> {
    require_columns(portfolio, &[YEAR, MONTH, DATE, TARGET, POSITION])?;
    let series = portfolio
        .clone()
        .lazy()
        .with_columns([(col(TARGET).cast(DataType::Float64)
            * col(POSITION).cast(DataType::Float64))
        .alias(WEIGHTED_RETURN)])
        .group_by([col(YEAR), col(MONTH), col(DATE)])
        .agg([col(WEIGHTED_RETURN).mean()])
        .sort([DATE], SortMultipleOptions::default())
        .collect()?;
    Ok(series)
}

/// The `weighted_return` column as plain values.
pub fn returns(series: &DataFrame) -> Result<Vec<f64>> {
    require_columns(series, &[WEIGHTED_RETURN])?;
    Ok(series
        .column(WEIGHTED_RETURN)?
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .flatten()
        .collect())
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (ddof = 1); `None` below two observations.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// `mean / std * sqrt(12)`; `None` with fewer than two points or zero deviation.
///
/// A constant series counts as zero deviation even when summation leaves a
/// residue such as `1e-18` for values like `0.1`.
pub fn sharpe_ratio(values: &[f64]) -> Option<f64> {
    let Some(std) = sample_std(values) else {
        warn!(points = values.len(), "Sharpe ratio undefined: fewer than 2 points");
        return None;
    };
    let m = mean(values);
    let constant = values.iter().all(|v| *v == values[0]);
    if constant || !std.is_finite() || std <= STD_TOLERANCE * m.abs().max(1.0) {
        warn!(points = values.len(), "Sharpe ratio undefined: zero deviation");
        return None;
    }
    Some(m / std * MONTHS_PER_YEAR.sqrt())
}

/// Sharpe ratio of a performance series.
pub fn sharpe(series: &DataFrame) -> Result<Option<f64>> {
    Ok(sharpe_ratio(&returns(series)?))
}

/// `(prod(1 + r))^(12 / n) - 1`.
pub fn annualized_return(series: &DataFrame) -> Result<f64> {
    let r = returns(series)?;
    if r.is_empty() {
        return Err(PortfolioError::EmptySeries(
            "annualized return of an empty series".into(),
        ));
    }
    let growth: f64 = r.iter().map(|v| 1.0 + v).product();
    Ok(growth.powf(MONTHS_PER_YEAR / r.len() as f64) - 1.0)
}

/// `std(r) * sqrt(12)`.
pub fn annualized_std(series: &DataFrame) -> Result<f64> {
    let r = returns(series)?;
    if r.is_empty() {
        return Err(PortfolioError::EmptySeries(
            "annualized deviation of an empty series".into(),
        ));
    }
    sample_std(&r)
        .map(|s| s * MONTHS_PER_YEAR.sqrt())
        .ok_or(PortfolioError::InsufficientData {
            required: 2,
            actual: r.len(),
        })
}

/// Inner-join the series with `benchmark` on (year, month) and add running
/// products of `1 + r` for both legs. The first row holds `1 + r_1`.
pub fn cumulative_series(
    series: &DataFrame,
    benchmark: &DataFrame,
    benchmark_column: &str,
) -> Result<DataFrame> {
    require_columns(series, &[YEAR, MONTH, DATE, WEIGHTED_RETURN])?;
    require_columns(benchmark, &[YEAR, MONTH, benchmark_column])?;

    let market = benchmark.clone().lazy().select([
        col(YEAR).cast(DataType::Int32),
        col(MONTH).cast(DataType::Int32),
        col(benchmark_column)
            .cast(DataType::Float64)
            .alias(BENCHMARK_RETURN),
    ]);
    let joined = series
        .clone()
        .lazy()
        .with_columns([
            col(YEAR).cast(DataType::Int32),
            col(MONTH).cast(DataType::Int32),
        ])
        .join(
            market,
            [col(YEAR), col(MONTH)],
            [col(YEAR), col(MONTH)],
            JoinArgs::new(JoinType::Inner),
        )
        .sort([DATE], SortMultipleOptions::default())
        .with_columns([
            (lit(1.0) + col(WEIGHTED_RETURN))
                .cum_prod(false)
                .alias(CUMULATIVE_PORTFOLIO),
            (lit(1.0) + col(BENCHMARK_RETURN))
                .cum_prod(false)
                .alias(CUMULATIVE_BENCHMARK),
        ])
        .collect()?;

    if joined.height() < series.height() {
        warn!(
            series = series.height(),
            joined = joined.height(),
            "Months without a benchmark return were dropped"
        );
    }
    Ok(joined)
}

/// Headline statistics of a performance series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    /// Annualized Sharpe ratio, `None` when undefined
    pub sharpe: Option<f64>,
    /// Compounded annual return
    pub annualized_return: f64,
    /// Annualized standard deviation
    pub annualized_std: f64,
    /// Number of months in the series
    pub months: usize,
}

impl PerformanceStats {
    /// Compute every statistic from a series with at least two months.
    pub fn from_series(series: &DataFrame) -> Result<Self> {
        Ok(Self {
            sharpe: sharpe(series)?,
            annualized_return: annualized_return(series)?,
            annualized_std: annualized_std(series)?,
            months: series.height(),
        })
    }
}
