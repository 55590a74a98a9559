//! Per-entity median imputation.

use crate::error::Result;
use montreal_data::schema::ENTITY;
use polars::prelude::*;
use tracing::warn;

/// Counters produced by [`impute_medians`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImputeCounts {
    /// Missing entries filled with the entity median
    pub imputed: usize,
    /// Entries left without a median and set to zero
    pub undefined_medians: usize,
}

/// Fill missing factor values with the entity's own median of that factor.
///
/// An entity with no observation of a factor has no median; those entries are
/// set to zero and counted. The stock filters run before this step make that
/// case unreachable for panels produced by the cleaner.
pub fn impute_medians(frame: DataFrame, factors: &[String]) -> Result<(DataFrame, ImputeCounts)> {
    let missing_before = null_total(&frame, factors)?;

    let filled = frame
        .lazy()
        .with_columns(
            factors
                .iter()
                .map(|f| {
                    col(f.as_str())
                        .fill_null(col(f.as_str()).median().over([col(ENTITY)]))
                        .alias(f.as_str())
                })
                .collect::<Vec<_>>(),
        )
        .collect()?;

    let undefined = null_total(&filled, factors)?;
    let filled = if undefined > 0 {
        warn!(
            entries = undefined,
            "Entity median undefined for some factors, substituting 0"
        );
        filled
            .lazy()
            .with_columns(
                factors
                    .iter()
                    .map(|f| col(f.as_str()).fill_null(lit(0.0)))
                    .collect::<Vec<_>>(),
            )
            .collect()?
    } else {
        filled
    };

    Ok((
        filled,
        ImputeCounts {
            imputed: missing_before - undefined,
            undefined_medians: undefined,
        },
    ))
}

fn null_total(frame: &DataFrame, factors: &[String]) -> Result<usize> {
    let mut total = 0;
    for f in factors {
        total += frame.column(f)?.null_count();
    }
    Ok(total)
}
