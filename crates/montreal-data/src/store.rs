//! CSV load/save of tables, factor lists and panel pairs.
//!
//! Every file handle opened here lives inside the function that opened it, so it
//! is closed on every exit path. Writers flush explicitly before returning.

use crate::error::{DataError, Result};
use crate::factor_list::FactorList;
use crate::panel::Panel;
use crate::schema::DATE;
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default factor list file name inside a data directory.
pub const FACTOR_FILE: &str = "factor.csv";
/// Default panel file name inside a data directory.
pub const DATA_FILE: &str = "data.csv";
/// Factor list file of a selected (reduced) panel.
pub const SELECTED_FACTOR_FILE: &str = "selected_factor.csv";
/// Data file of a selected (reduced) panel.
pub const SELECTED_DATA_FILE: &str = "selected_data.csv";

/// The two files that always travel together: factor list and panel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelFiles {
    /// Factor list file (single `variable` column).
    pub factor_file: PathBuf,
    /// Panel data file.
    pub data_file: PathBuf,
}

impl PanelFiles {
    /// Explicit pair of paths.
    pub fn new(factor_file: impl Into<PathBuf>, data_file: impl Into<PathBuf>) -> Self {
        Self {
            factor_file: factor_file.into(),
            data_file: data_file.into(),
        }
    }

    /// Cleaned panel pair inside `dir`.
    pub fn clean(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(FACTOR_FILE), dir.join(DATA_FILE))
    }

    /// Selected panel pair inside `dir`.
    pub fn selected(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(SELECTED_FACTOR_FILE), dir.join(SELECTED_DATA_FILE))
    }
}

/// Read a comma-delimited table with a header row.
///
/// With `parse_dates`, the `date` column must come back as a calendar date.
/// ISO text dates are parsed by the reader; integer `YYYYMMDD` dates are
/// converted here. Anything else is a schema error.
pub fn read_table(path: impl AsRef<Path>, parse_dates: bool) -> Result<DataFrame> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| DataError::io(path, e))?;

    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .map_parse_options(|opts| opts.with_try_parse_dates(parse_dates))
        .into_reader_with_file_handle(file)
        .finish()?;
    info!(path = %path.display(), rows = frame.height(), "Read table");

    if parse_dates && frame.get_column_names().iter().any(|c| c.as_str() == DATE) {
        coerce_date_column(frame)
    } else {
        Ok(frame)
    }
}

/// Write a table as comma-delimited text with a header row.
///
/// Parent directories are created. Dates are written as `YYYY-MM-DD`.
pub fn write_table(path: impl AsRef<Path>, frame: &DataFrame) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DataError::io(parent, e))?;
    }

    let file = File::create(path).map_err(|e| DataError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let mut frame = frame.clone();
    CsvWriter::new(&mut writer)
        .include_header(true)
        .finish(&mut frame)?;
    writer.flush().map_err(|e| DataError::io(path, e))?;

    info!(path = %path.display(), rows = frame.height(), "Saved table");
    Ok(())
}

/// Read a factor list file.
pub fn load_factor_list(path: impl AsRef<Path>) -> Result<FactorList> {
    FactorList::from_frame(&read_table(path, false)?)
}

/// Write a factor list file.
pub fn save_factor_list(path: impl AsRef<Path>, factors: &FactorList) -> Result<()> {
    write_table(path, &factors.to_frame()?)
}

/// Load a factor list and its panel.
///
/// The panel must contain every listed factor.
pub fn load_panel(files: &PanelFiles) -> Result<(FactorList, Panel)> {
    let factors = load_factor_list(&files.factor_file)?;
    let frame = read_table(&files.data_file, true)?;
    factors.ensure_columns_of(&frame)?;
    let panel = Panel::new(frame)?;
    debug!(factors = factors.len(), rows = panel.height(), "Loaded panel pair");
    Ok((factors, panel))
}

/// Save a factor list and its panel.
pub fn save_panel(files: &PanelFiles, factors: &FactorList, panel: &Panel) -> Result<()> {
    factors.ensure_columns_of(panel.frame())?;
    save_factor_list(&files.factor_file, factors)?;
    write_table(&files.data_file, panel.frame())
}

fn coerce_date_column(mut frame: DataFrame) -> Result<DataFrame> {
    let dtype = frame.column(DATE)?.dtype().clone();
    match dtype {
        DataType::Date => Ok(frame),
        DataType::Datetime(_, _) => {
            let dates = frame.column(DATE)?.cast(&DataType::Date)?;
            frame.with_column(dates)?;
            Ok(frame)
        }
        DataType::Int64 | DataType::Int32 => {
            let raw = frame.column(DATE)?.cast(&DataType::Int64)?;
            let dates: Vec<Option<NaiveDate>> = raw
                .i64()?
                .into_iter()
                .map(|v| v.and_then(yyyymmdd))
                .collect();
            if dates.iter().any(Option::is_none) {
                return Err(DataError::Schema(format!(
                    "`{DATE}` contains values that are not YYYYMMDD dates"
                )));
            }
            frame.with_column(Column::new(DATE.into(), dates))?;
            Ok(frame)
        }
        other => Err(DataError::Schema(format!(
            "`{DATE}` could not be parsed as a date (found {other})"
        ))),
    }
}

fn yyyymmdd(value: i64) -> Option<NaiveDate> {
    let year = i32::try_from(value / 10_000).ok()?;
    let month = u32::try_from((value / 100) % 100).ok()?;
    let day = u32::try_from(value % 100).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yyyymmdd() {
        assert_eq!(yyyymmdd(20000131), NaiveDate::from_ymd_opt(2000, 1, 31));
        assert_eq!(yyyymmdd(20001331), None);
    }

    #[test]
    fn test_panel_files_layout() {
        let files = PanelFiles::clean("clean_data");
        assert_eq!(files.factor_file, PathBuf::from("clean_data/factor.csv"));
        assert_eq!(files.data_file, PathBuf::from("clean_data/data.csv"));

        let files = PanelFiles::selected("clean_data");
        assert_eq!(
            files.data_file,
            PathBuf::from("clean_data/selected_data.csv")
        );
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_table("does/not/exist.csv", false).unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }
}
