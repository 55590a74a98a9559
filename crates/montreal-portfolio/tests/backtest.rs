//! Portfolio construction and evaluation over a synthetic prediction panel.

use chrono::NaiveDate;
use montreal_portfolio::{
    CUMULATIVE_BENCHMARK, CUMULATIVE_PORTFOLIO, POSITION, PortfolioConfig, PortfolioEngine,
    PortfolioError, WEIGHTED_RETURN, build_portfolio, search_best_size, split_counts,
};
use polars::prelude::*;
use rstest::rstest;

const STOCKS: i64 = 20;
const MONTHS: usize = 24;

fn month_date(m: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2015 + (m / 12) as i32, (m % 12) as u32 + 1, 28).unwrap()
}

fn predictions(months: usize) -> DataFrame {
    let mut date = Vec::new();
    let mut year = Vec::new();
    let mut month = Vec::new();
    let mut permno = Vec::new();
    let mut exret = Vec::new();
    let mut xgb = Vec::new();
    for m in 0..months {
        for s in 0..STOCKS {
            let score = ((s as usize * 7 + m * 3) % 20) as f64 / 20.0;
            let noise = (((s as usize + m) % 5) as f64 - 2.0) * 0.001;
            date.push(month_date(m));
            year.push(2015 + (m / 12) as i32);
            month.push((m % 12) as i32 + 1);
            permno.push(1000 + s);
            exret.push(0.02 * (score - 0.5) + noise);
            xgb.push(score);
        }
    }
    df![
        "date" => date,
        "permno" => permno,
        "stock_exret" => exret,
        "xgb" => xgb,
        "year" => year,
        "month" => month
    ]
    .unwrap()
}

fn benchmark() -> DataFrame {
    let n = MONTHS + 12;
    df![
        "year" => (0..n).map(|m| 2015 + (m / 12) as i64).collect::<Vec<_>>(),
        "month" => (0..n).map(|m| (m % 12) as i64 + 1).collect::<Vec<_>>(),
        "sp_ret" => (0..n).map(|m| 0.005 + (m % 3) as f64 * 0.001).collect::<Vec<_>>()
    ]
    .unwrap()
}

fn leg_counts(portfolio: &DataFrame) -> DataFrame {
    portfolio
        .clone()
        .lazy()
        .group_by([col("date")])
        .agg([
            col(POSITION).eq(lit(1i32)).sum().alias("longs"),
            col(POSITION).eq(lit(-1i32)).sum().alias("shorts"),
        ])
        .collect()
        .unwrap()
}

#[rstest]
#[case(10, 0.7)]
#[case(7, 0.5)]
#[case(20, 0.3)]
fn test_leg_sizes_follow_split(#[case] n: usize, #[case] split: f64) {
    let portfolio = build_portfolio(&predictions(MONTHS), "xgb", n, split).unwrap();
    let (long_n, short_n) = split_counts(n, split);
    let counts = leg_counts(&portfolio);
    assert_eq!(counts.height(), MONTHS);
    for column in ["longs", "shorts"] {
        let expected = if column == "longs" { long_n } else { short_n } as u32;
        let values = counts.column(column).unwrap().cast(&DataType::UInt32).unwrap();
        assert!(values.u32().unwrap().into_no_null_iter().all(|v| v == expected));
    }
}

#[test]
fn test_build_is_idempotent() {
    let preds = predictions(MONTHS);
    let a = build_portfolio(&preds, "xgb", 9, 0.7).unwrap();
    let b = build_portfolio(&preds, "xgb", 9, 0.7).unwrap();
    assert!(a.equals(&b));
}

#[test]
fn test_search_picks_smallest_of_the_best() {
    let preds = predictions(MONTHS);
    let search = search_best_size(&preds, "xgb", 4, 12, 0.5).unwrap();
    assert_eq!(search.scores.len(), 9);
    assert_eq!(
        search.scores.iter().map(|s| s.size).collect::<Vec<_>>(),
        (4..=12).collect::<Vec<_>>()
    );

    let best = search
        .scores
        .iter()
        .filter_map(|s| s.sharpe)
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(search.best_sharpe, best);
    let first = search
        .scores
        .iter()
        .find(|s| s.sharpe == Some(best))
        .unwrap();
    assert_eq!(search.best_size, first.size);
}

#[test]
fn test_single_month_has_no_defined_sharpe() {
    let preds = predictions(1);
    assert!(matches!(
        search_best_size(&preds, "xgb", 2, 4, 0.5),
        Err(PortfolioError::NoDefinedSharpe { low: 2, high: 4 })
    ));
}

#[test]
fn test_engine_evaluates_window_and_benchmark() {
    let config = PortfolioConfig {
        portfolio_size_search_range: (4, 10),
        evaluation_start: NaiveDate::from_ymd_opt(2015, 7, 1),
        evaluation_end: None,
        ..Default::default()
    };
    let evaluation = PortfolioEngine::new(config)
        .evaluate(&predictions(MONTHS), Some(&benchmark()))
        .unwrap();

    assert_eq!(evaluation.stats.months, MONTHS - 6);
    assert!((4..=10).contains(&evaluation.search.best_size));

    let cumulative = evaluation.cumulative.unwrap();
    assert_eq!(cumulative.height(), MONTHS - 6);
    let first_return = cumulative.column(WEIGHTED_RETURN).unwrap().f64().unwrap().get(0).unwrap();
    let first_cum = cumulative.column(CUMULATIVE_PORTFOLIO).unwrap().f64().unwrap().get(0).unwrap();
    assert!((first_cum - (1.0 + first_return)).abs() < 1e-12);
    let first_market = cumulative.column(CUMULATIVE_BENCHMARK).unwrap().f64().unwrap().get(0).unwrap();
    // July 2015 is month index 6: 0.005 + 0 * 0.001
    assert!((first_market - 1.005).abs() < 1e-12);
}

#[test]
fn test_empty_window_is_an_error() {
    let config = PortfolioConfig {
        evaluation_start: NaiveDate::from_ymd_opt(2030, 1, 1),
        evaluation_end: NaiveDate::from_ymd_opt(2030, 12, 31),
        ..Default::default()
    };
    assert!(matches!(
        PortfolioEngine::new(config).evaluate(&predictions(MONTHS), None),
        Err(PortfolioError::EmptySeries(_))
    ));
}
