//! Column conventions shared by every stage.

use crate::error::{DataError, Result};
use polars::prelude::*;

/// Permanent entity (stock) identifier.
pub const ENTITY: &str = "permno";
/// Calendar year of the observation.
pub const YEAR: &str = "year";
/// Calendar month of the observation.
pub const MONTH: &str = "month";
/// Observation date.
pub const DATE: &str = "date";
/// Company name.
pub const NAME: &str = "comp_name";
/// Monthly excess return, the regression target.
pub const TARGET: &str = "stock_exret";
/// Single column of a factor list file.
pub const FACTOR_LIST_COLUMN: &str = "variable";

/// Non-factor columns of a panel, in output order.
pub const IDENTIFYING_COLUMNS: [&str; 6] = [YEAR, MONTH, DATE, ENTITY, NAME, TARGET];

/// Non-factor columns kept when a panel is projected onto a factor subset.
pub const EXTRACT_COLUMNS: [&str; 5] = [DATE, YEAR, MONTH, ENTITY, TARGET];

/// Whether `name` is one of the identifying/target columns.
pub fn is_identifying(name: &str) -> bool {
    IDENTIFYING_COLUMNS.contains(&name)
}

/// Column names of a frame as owned strings.
pub fn column_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

/// Fail with [`DataError::MissingColumns`] unless every expected column is present.
pub fn require_columns<S: AsRef<str>>(frame: &DataFrame, expected: &[S]) -> Result<()> {
    let actual = column_names(frame);
    let missing: Vec<String> = expected
        .iter()
        .map(|name| name.as_ref())
        .filter(|name| !actual.iter().any(|a| a == name))
        .map(str::to_string)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DataError::MissingColumns {
            missing,
            expected: expected.iter().map(|s| s.as_ref().to_string()).collect(),
            actual,
        })
    }
}

/// Identifying columns present in `frame`, in canonical order.
pub fn present_identifying(frame: &DataFrame) -> Vec<&'static str> {
    let names = column_names(frame);
    IDENTIFYING_COLUMNS
        .iter()
        .copied()
        .filter(|c| names.iter().any(|n| n == c))
        .collect()
}

/// Entity ids of every row, widened to `i64`.
pub fn entity_column(frame: &DataFrame) -> Result<Vec<i64>> {
    let ids = frame.column(ENTITY)?.cast(&DataType::Int64)?;
    let ids = ids.i64()?;
    if ids.null_count() > 0 {
        return Err(DataError::Schema(format!(
            "{} null values in `{ENTITY}`",
            ids.null_count()
        )));
    }
    Ok(ids.into_no_null_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_columns_reports_expected_and_actual() {
        let df = df!["permno" => [1i64, 2], "date" => ["2020-01-31", "2020-01-31"]].unwrap();

        assert!(require_columns(&df, &[ENTITY, DATE]).is_ok());

        match require_columns(&df, &[ENTITY, TARGET]) {
            Err(DataError::MissingColumns {
                missing,
                expected,
                actual,
            }) => {
                assert_eq!(missing, vec![TARGET.to_string()]);
                assert_eq!(expected, vec![ENTITY.to_string(), TARGET.to_string()]);
                assert_eq!(actual, vec![ENTITY.to_string(), DATE.to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_present_identifying_keeps_canonical_order() {
        let df = df![
            "stock_exret" => [0.1],
            "permno" => [7i64],
            "be_me" => [0.5],
            "year" => [2020i64]
        ]
        .unwrap();

        assert_eq!(present_identifying(&df), vec![YEAR, ENTITY, TARGET]);
        assert!(is_identifying("comp_name"));
        assert!(!is_identifying("be_me"));
    }

    #[test]
    fn test_entity_column_rejects_nulls() {
        let df = df!["permno" => [Some(1i32), None]].unwrap();
        assert!(matches!(entity_column(&df), Err(DataError::Schema(_))));

        let df = df!["permno" => [3i32, 4]].unwrap();
        assert_eq!(entity_column(&df).unwrap(), vec![3, 4]);
    }
}
