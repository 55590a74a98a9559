//! Per-entity dense-rank normalization onto `[-1, 1]`.

use crate::error::Result;
use montreal_data::schema::{ENTITY, column_names};
use polars::prelude::*;
use tracing::debug;

fn rank_column(factor: &str) -> String {
    format!("__{factor}_rank")
}

fn max_rank_column(factor: &str) -> String {
    format!("__{factor}_max_rank")
}

/// 0-based dense rank of `factor` within each entity's own time series.
fn dense_rank(factor: &str) -> Expr {
    col(factor)
        .rank(
            RankOptions {
                method: RankMethod::Dense,
                descending: false,
            },
            None,
        )
        .over([col(ENTITY)])
        .cast(DataType::Float64)
        - lit(1.0)
}

/// Replace every factor by `rank / max_rank * 2 - 1`, ranks taken per entity.
///
/// When an entity's factor series is constant (`max_rank == 0`) the value is 0
/// exactly. Returns the frame and the number of values that hit that case.
pub fn rank_normalize(frame: DataFrame, factors: &[String]) -> Result<(DataFrame, usize)> {
    let output_columns = column_names(&frame);

    let ranked = frame
        .lazy()
        .with_columns(
            factors
                .iter()
                .map(|f| dense_rank(f).alias(rank_column(f)))
                .collect::<Vec<_>>(),
        )
        .with_columns(
            factors
                .iter()
                .map(|f| {
                    col(rank_column(f))
                        .max()
                        .over([col(ENTITY)])
                        .alias(max_rank_column(f))
                })
                .collect::<Vec<_>>(),
        )
        .collect()?;

    let mut constant = 0;
    for f in factors {
        constant += ranked
            .column(&max_rank_column(f))?
            .f64()?
            .into_iter()
            .filter(|v| *v == Some(0.0))
            .count();
    }
    if constant > 0 {
        debug!(values = constant, "Constant factor series normalized to 0");
    }

    let normalized = ranked
        .lazy()
        .with_columns(
            factors
                .iter()
                .map(|f| {
                    let rank = col(rank_column(f));
                    let max_rank = col(max_rank_column(f));
                    when(max_rank.clone().eq(lit(0.0)))
                        .then(lit(0.0))
                        .otherwise(rank / max_rank * lit(2.0) - lit(1.0))
                        .alias(f.as_str())
                })
                .collect::<Vec<_>>(),
        )
        .select(
            output_columns
                .iter()
                .map(|c| col(c.as_str()))
                .collect::<Vec<_>>(),
        )
        .collect()?;

    Ok((normalized, constant))
}
