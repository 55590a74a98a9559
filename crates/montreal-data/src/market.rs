//! Predictions and market benchmark inputs.
//!
//! The prediction stage is an external process; all we rely on is the schema of
//! the file it leaves behind. Same for the market index file.

use crate::error::{DataError, Result};
use crate::schema::{DATE, ENTITY, MONTH, TARGET, YEAR, column_names, require_columns};
use crate::store::read_table;
use polars::prelude::*;
use std::path::Path;

/// Columns every predictions file carries besides the model score columns.
pub const PREDICTION_COLUMNS: [&str; 3] = [DATE, ENTITY, TARGET];

/// Load a predictions file and check it carries a score column per model.
///
/// `year`/`month` are derived from `date` when the file lacks them.
pub fn load_predictions<S: AsRef<str>>(path: impl AsRef<Path>, models: &[S]) -> Result<DataFrame> {
    let frame = read_table(path, true)?;
    let mut expected: Vec<&str> = PREDICTION_COLUMNS.to_vec();
    expected.extend(models.iter().map(|m| m.as_ref()));
    require_columns(&frame, &expected)?;

    let frame = with_calendar_columns(frame)?;
    if frame.height() == 0 {
        return Err(DataError::Empty("predictions".to_string()));
    }
    Ok(frame)
}

/// Load the market benchmark file: `year`, `month` and the return column.
pub fn load_benchmark(path: impl AsRef<Path>, return_column: &str) -> Result<DataFrame> {
    let frame = read_table(path, false)?;
    require_columns(&frame, &[YEAR, MONTH, return_column])?;

    let frame = frame
        .lazy()
        .select([
            col(YEAR).cast(DataType::Int32),
            col(MONTH).cast(DataType::Int32),
            col(return_column).cast(DataType::Float64),
        ])
        .collect()?;
    Ok(frame)
}

/// Add `year` and `month` (Int32) derived from `date` when they are absent,
/// and normalize existing ones to Int32.
pub fn with_calendar_columns(frame: DataFrame) -> Result<DataFrame> {
    let names = column_names(&frame);
    let has = |c: &str| names.iter().any(|n| n == c);

    let year = if has(YEAR) {
        col(YEAR).cast(DataType::Int32)
    } else {
        col(DATE).dt().year().cast(DataType::Int32).alias(YEAR)
    };
    let month = if has(MONTH) {
        col(MONTH).cast(DataType::Int32)
    } else {
        col(DATE).dt().month().cast(DataType::Int32).alias(MONTH)
    };

    Ok(frame.lazy().with_columns([year, month]).collect()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_calendar_columns_from_date() {
        let df = df![
            "date" => [NaiveDate::from_ymd_opt(2015, 3, 31).unwrap()],
            "permno" => [1i64]
        ]
        .unwrap();

        let out = with_calendar_columns(df).unwrap();
        assert_eq!(out.column("year").unwrap().i32().unwrap().get(0), Some(2015));
        assert_eq!(out.column("month").unwrap().i32().unwrap().get(0), Some(3));
    }

    #[test]
    fn test_existing_calendar_columns_are_kept() {
        let df = df![
            "date" => [NaiveDate::from_ymd_opt(2015, 3, 31).unwrap()],
            "year" => [1999i64],
            "month" => [12i64]
        ]
        .unwrap();

        let out = with_calendar_columns(df).unwrap();
        assert_eq!(out.column("year").unwrap().i32().unwrap().get(0), Some(1999));
        assert_eq!(out.column("month").unwrap().i32().unwrap().get(0), Some(12));
    }
}
