//! Monthly long/short portfolio construction from model scores.

use crate::config::check_split;
use crate::error::{PortfolioError, Result};
use chrono::NaiveDate;
use montreal_data::schema::{DATE, ENTITY, TARGET, require_columns};
use polars::prelude::*;
use tracing::debug;

/// Position column: `1` long, `-1` short.
pub const POSITION: &str = "position";

const LONG_SLOT: &str = "__long_slot";
const SHORT_SLOT: &str = "__short_slot";
const IS_LONG: &str = "__is_long";

/// Long and short counts for a portfolio of `n` stocks: `floor(n * split)` long.
pub fn split_counts(n: usize, long_short_split: f64) -> (usize, usize) {
    let long_n = ((n as f64 * long_short_split).floor() as usize).min(n);
    (long_n, n - long_n)
}

/// Select each date's long and short positions by the `model` score column.
///
/// Per date the `long_n` highest scores go long and the `short_n` lowest of the
/// remaining stocks go short, so a stock is never both. Ties are broken by
/// `permno` ascending. Rows without a score are ignored. With fewer than
/// `n_long_short` stocks on a date, longs are filled first.
///
/// Returns the selected prediction rows plus [`POSITION`], sorted by date,
/// position (longs first) and score.
pub fn build_portfolio(
    predictions: &DataFrame,
    model: &str,
    n_long_short: usize,
    long_short_split: f64,
) -> Result<DataFrame> {
    check_split(long_short_split)?;
    if n_long_short == 0 {
        return Err(PortfolioError::InvalidParameter(
            "portfolio size must be positive".into(),
        ));
    }
    require_columns(predictions, &[DATE, ENTITY, TARGET, model])?;

    let (long_n, short_n) = split_counts(n_long_short, long_short_split);
    let output_columns: Vec<Expr> = predictions
        .get_column_names()
        .into_iter()
        .map(|name| col(name.clone()))
        .chain(std::iter::once(col(POSITION)))
        .collect();

    let portfolio = predictions
        .clone()
        .lazy()
        .filter(col(model).is_not_null())
        // rank for the long leg: score descending, permno ascending
        .sort(
            [DATE, model, ENTITY],
            SortMultipleOptions::default()
                .with_order_descending_multi([false, true, false])
                .with_maintain_order(true),
        )
        .with_columns([col(ENTITY).cum_count(false).over([col(DATE)]).alias(LONG_SLOT)])
        .with_columns([col(LONG_SLOT).lt_eq(lit(long_n as u32)).alias(IS_LONG)])
        // rank the rest for the short leg: score ascending, permno ascending
        .sort(
            [DATE, model, ENTITY],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .with_columns([col(IS_LONG)
            .not()
            .cast(DataType::UInt32)
            .cum_sum(false)
            .over([col(DATE)])
            .alias(SHORT_SLOT)])
        .filter(
            col(IS_LONG).or(col(IS_LONG)
                .not()
                .and(col(SHORT_SLOT).lt_eq(lit(short_n as u32)))),
        )
        .with_columns([when(col(IS_LONG))
            .then(lit(1i32))
            .otherwise(lit(-1i32))
            .alias(POSITION)])
        .select(output_columns)
        .sort(
            [DATE, POSITION, model, ENTITY],
            SortMultipleOptions::default()
                .with_order_descending_multi([false, true, true, false])
                .with_maintain_order(true),
        )
        .collect()?;

    debug!(
        size = n_long_short,
        long = long_n,
        short = short_n,
        rows = portfolio.height(),
        "Built portfolio"
    );
    Ok(portfolio)
}

/// Keep predictions dated within `[start, end]`; open bounds keep everything on that side.
pub fn filter_window(
    predictions: &DataFrame,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<DataFrame> {
    require_columns(predictions, &[DATE])?;
    let mut keep = lit(true);
    if let Some(start) = start {
        keep = keep.and(col(DATE).gt_eq(lit(start)));
    }
    if let Some(end) = end {
        keep = keep.and(col(DATE).lt_eq(lit(end)));
    }
    let filtered = predictions.clone().lazy().filter(keep).collect()?;
    debug!(
        before = predictions.height(),
        after = filtered.height(),
        "Applied evaluation window"
    );
    Ok(filtered)
}
