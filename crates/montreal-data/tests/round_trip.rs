//! Save/load round trips through the filesystem.

use chrono::NaiveDate;
use montreal_data::{
    DataError, FactorList, Panel, PanelFiles, load_benchmark, load_panel, load_predictions,
    read_table, save_panel, write_table,
};
use polars::prelude::*;
use rstest::rstest;
use tempfile::TempDir;

fn panel() -> Panel {
    let dates: Vec<NaiveDate> = [(2020, 1, 31), (2020, 2, 29), (2020, 1, 31), (2020, 2, 29)]
        .iter()
        .map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
        .collect();
    let frame = df![
        "year" => [2020i64, 2020, 2020, 2020],
        "month" => [1i64, 2, 1, 2],
        "date" => dates,
        "permno" => [10001i64, 10001, 10002, 10002],
        "comp_name" => ["ALPHA INC", "ALPHA INC", "BETA CORP", "BETA CORP"],
        "stock_exret" => [0.0123456789, -0.5, 0.25, 1e-7],
        "be_me" => [Some(0.1), None, Some(-1.0 / 3.0), Some(2.5)],
        "ret_12_1" => [1.0, 2.0, 3.0, 4.0]
    ]
    .unwrap();
    Panel::new(frame).unwrap()
}

#[test]
fn test_panel_pair_round_trip() {
    let dir = TempDir::new().unwrap();
    let files = PanelFiles::clean(dir.path());
    let factors = FactorList::new(["be_me", "ret_12_1"]).unwrap();
    let original = panel();

    save_panel(&files, &factors, &original).unwrap();
    let (loaded_factors, loaded) = load_panel(&files).unwrap();

    assert_eq!(loaded_factors, factors);
    assert_eq!(loaded.column_names(), original.column_names());
    assert_eq!(loaded.height(), original.height());
    assert_eq!(loaded.frame().column("date").unwrap().dtype(), &DataType::Date);
    assert_eq!(
        loaded
            .frame()
            .column("date")
            .unwrap()
            .cast(&DataType::String)
            .unwrap()
            .str()
            .unwrap()
            .get(1),
        Some("2020-02-29")
    );

    for name in ["stock_exret", "be_me", "ret_12_1"] {
        let a = original.frame().column(name).unwrap().f64().unwrap();
        let b = loaded.frame().column(name).unwrap().cast(&DataType::Float64).unwrap();
        let b = b.f64().unwrap();
        for (x, y) in a.into_iter().zip(b.into_iter()) {
            match (x, y) {
                (Some(x), Some(y)) => assert!((x - y).abs() <= 1e-12 * x.abs().max(1.0)),
                (None, None) => {}
                other => panic!("value mismatch in {name}: {other:?}"),
            }
        }
    }
}

#[test]
fn test_integer_dates_are_parsed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.csv");
    std::fs::write(&path, "permno,date,stock_exret\n1,20000131,0.1\n1,20000229,0.2\n").unwrap();

    let frame = read_table(&path, true).unwrap();
    let dates = frame.column("date").unwrap();
    assert_eq!(dates.dtype(), &DataType::Date);
    assert_eq!(
        dates.cast(&DataType::String).unwrap().str().unwrap().get(1),
        Some("2000-02-29")
    );
}

#[rstest]
#[case("date,permno,stock_exret,xgb\n2015-01-31,1,0.1,0.5\n", true)]
#[case("date,permno,stock_exret\n2015-01-31,1,0.1\n", false)]
#[case("date,permno,xgb\n2015-01-31,1,0.5\n", false)]
fn test_predictions_schema(#[case] contents: &str, #[case] valid: bool) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("output.csv");
    std::fs::write(&path, contents).unwrap();

    let result = load_predictions(&path, &["xgb"]);
    assert_eq!(result.is_ok(), valid, "{result:?}");
    if let Err(err) = result {
        assert!(matches!(err, DataError::MissingColumns { .. }));
    }
}

#[test]
fn test_benchmark_requires_return_column() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mkt_ind.csv");
    std::fs::write(&path, "year,month,sp_ret\n2010,1,-0.037\n2010,2,0.029\n").unwrap();

    let bench = load_benchmark(&path, "sp_ret").unwrap();
    assert_eq!(bench.height(), 2);
    assert!(load_benchmark(&path, "benchmark_return").is_err());
}

#[test]
fn test_write_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/deeper/table.csv");
    let frame = df!["a" => [1i64, 2]].unwrap();
    write_table(&path, &frame).unwrap();
    assert_eq!(read_table(&path, false).unwrap().height(), 2);
}
