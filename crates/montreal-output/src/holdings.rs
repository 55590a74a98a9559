//! Most frequently held stocks of a portfolio.

use montreal_data::DataError;
use montreal_data::schema::{ENTITY, NAME, require_columns};
use montreal_portfolio::POSITION;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const MONTHS_HELD: &str = "months_held";
const LONG_MONTHS: &str = "long_months";
const SHORT_MONTHS: &str = "short_months";

/// Errors from summarising holdings.
#[derive(Debug, Error)]
pub enum HoldingsError {
    /// Missing columns or other input problems.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Polars error.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// One stock and how often it was held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    /// Entity id
    pub permno: i64,
    /// Company name, when the name table has one
    pub comp_name: Option<String>,
    /// Months in the portfolio on either leg
    pub months_held: u32,
    /// Months held long
    pub long_months: u32,
    /// Months held short
    pub short_months: u32,
}

/// The `n` stocks appearing in the most portfolio months, joined to their names.
///
/// `names` is any frame with `permno` and, optionally, `comp_name` (usually the
/// raw or cleaned panel); the first non-null name per stock is used. Ties on the
/// count are ordered by `permno` ascending.
pub fn top_holdings(
    portfolio: &DataFrame,
    names: &DataFrame,
    n: usize,
) -> Result<Vec<Holding>, HoldingsError> {
    require_columns(portfolio, &[ENTITY, POSITION])?;
    require_columns(names, &[ENTITY])?;

    let counts = portfolio
        .clone()
        .lazy()
        .group_by([col(ENTITY).cast(DataType::Int64)])
        .agg([
            col(POSITION).count().cast(DataType::UInt32).alias(MONTHS_HELD),
            col(POSITION)
                .eq(lit(1i32))
                .sum()
                .cast(DataType::UInt32)
                .alias(LONG_MONTHS),
            col(POSITION)
                .eq(lit(-1i32))
                .sum()
                .cast(DataType::UInt32)
                .alias(SHORT_MONTHS),
        ])
        .sort(
            [MONTHS_HELD, ENTITY],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .limit(n as IdxSize);

    let has_names = names.get_column_names().iter().any(|c| c.as_str() == NAME);
    let lookup = if has_names {
        names
            .clone()
            .lazy()
            .filter(col(NAME).is_not_null())
            .group_by_stable([col(ENTITY).cast(DataType::Int64)])
            .agg([col(NAME).cast(DataType::String).first()])
    } else {
        names
            .clone()
            .lazy()
            .select([col(ENTITY).cast(DataType::Int64)])
            .unique_stable(None, UniqueKeepStrategy::First)
            .with_columns([lit(NULL).cast(DataType::String).alias(NAME)])
    };

    let table = counts
        .join(
            lookup,
            [col(ENTITY)],
            [col(ENTITY)],
            JoinArgs::new(JoinType::Left),
        )
        .sort(
            [MONTHS_HELD, ENTITY],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .collect()?;

    let ids = table.column(ENTITY)?.i64()?;
    let held = table.column(MONTHS_HELD)?.u32()?;
    let long = table.column(LONG_MONTHS)?.u32()?;
    let short = table.column(SHORT_MONTHS)?.u32()?;
    let labels = table.column(NAME)?.str()?;

    let holdings: Vec<Holding> = (0..table.height())
        .filter_map(|i| {
            Some(Holding {
                permno: ids.get(i)?,
                comp_name: labels.get(i).map(str::to_string),
                months_held: held.get(i).unwrap_or(0),
                long_months: long.get(i).unwrap_or(0),
                short_months: short.get(i).unwrap_or(0),
            })
        })
        .collect();
    debug!(requested = n, found = holdings.len(), "Summarised holdings");
    Ok(holdings)
}
