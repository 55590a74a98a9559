//! End-to-end properties of the cleaning pipeline.

use chrono::NaiveDate;
use montreal_clean::{CleanConfig, CleanError, PanelCleaner};
use montreal_data::Panel;
use polars::prelude::*;
use rstest::rstest;

fn month_end(i: usize) -> NaiveDate {
    let year = 2000 + (i / 12) as i32;
    let month = (i % 12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}

/// Build a panel from per-entity factor series; each entity starts at month 0.
fn build_panel(series: &[(i64, Vec<Option<f64>>, Vec<Option<f64>>)]) -> Panel {
    let mut permno = Vec::new();
    let mut dates = Vec::new();
    let mut years = Vec::new();
    let mut months = Vec::new();
    let mut names = Vec::new();
    let mut exret = Vec::new();
    let mut f = Vec::new();
    let mut g = Vec::new();

    for (id, fs, gs) in series {
        for (i, (fv, gv)) in fs.iter().zip(gs.iter()).enumerate() {
            let date = month_end(i);
            permno.push(*id);
            years.push(2000 + (i / 12) as i64);
            months.push((i % 12) as i64 + 1);
            dates.push(date);
            names.push(format!("COMPANY {id}"));
            exret.push(0.01 * (i as f64 + 1.0));
            f.push(*fv);
            g.push(*gv);
        }
    }

    let frame = df![
        "year" => years,
        "month" => months,
        "date" => dates,
        "permno" => permno,
        "comp_name" => names,
        "stock_exret" => exret,
        "f" => f,
        "g" => g
    ]
    .unwrap();
    Panel::new(frame).unwrap()
}

fn some(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

fn factor_names() -> Vec<String> {
    vec!["f".to_string(), "g".to_string()]
}

fn config(months: usize) -> CleanConfig {
    CleanConfig {
        months_threshold: months,
        ..Default::default()
    }
}

#[test]
fn test_factor_dropped_when_one_entity_drives_missing_fraction() {
    // Entity 1 misses `f` on 6 of its 8 rows: 6 of 12 panel rows overall.
    let mut f1 = vec![None; 6];
    f1.extend([Some(1.0), Some(2.0)]);
    let panel = build_panel(&[
        (1, f1, some(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])),
        (2, some(&[1.0, 2.0]), some(&[3.0, 4.0])),
        (3, some(&[5.0, 6.0]), some(&[7.0, 8.0])),
    ]);

    let outcome = PanelCleaner::new(config(2)).clean(&factor_names(), &panel).unwrap();

    assert_eq!(outcome.factors.names(), vec!["g".to_string()]);
    assert_eq!(outcome.report.output_entities, 3);
    assert!(!outcome.panel.column_names().contains(&"f".to_string()));
}

#[test]
fn test_zero_heavy_factor_is_dropped() {
    let panel = build_panel(&[
        (1, some(&[0.0, 0.0, 1.0, 2.0]), some(&[1.0, 2.0, 3.0, 4.0])),
        (2, some(&[3.0, 4.0, 5.0, 6.0]), some(&[1.0, 2.0, 3.0, 4.0])),
    ]);
    // 2 zeros over 8 rows = 25% >= 20%
    let outcome = PanelCleaner::new(config(1)).clean(&factor_names(), &panel).unwrap();
    assert_eq!(outcome.factors.names(), vec!["g".to_string()]);
}

#[test]
fn test_retained_factors_respect_thresholds_on_original_panel() {
    let panel = build_panel(&[
        (1, vec![Some(1.0), None, Some(3.0), Some(4.0)], some(&[0.0, 1.0, 2.0, 3.0])),
        (2, some(&[5.0, 6.0, 7.0, 8.0]), some(&[4.0, 5.0, 6.0, 7.0])),
        (3, some(&[9.0, 10.0, 11.0, 12.0]), some(&[8.0, 9.0, 10.0, 11.0])),
    ]);
    let cfg = config(1);
    let outcome = PanelCleaner::new(cfg).clean(&factor_names(), &panel).unwrap();

    let rows = panel.height() as f64;
    for factor in outcome.factors.iter() {
        let column = panel.frame().column(factor).unwrap();
        let values = column.f64().unwrap();
        let missing = values.null_count() as f64;
        let zeros = values.into_iter().filter(|v| *v == Some(0.0)).count() as f64;
        assert!(missing / rows < cfg.missing_threshold);
        assert!(zeros / rows < cfg.zero_threshold);
    }
    assert_eq!(outcome.factors.len(), 2);
}

#[test]
fn test_output_has_no_missing_and_stays_in_unit_interval() {
    let panel = build_panel(&[
        (1, vec![Some(1.0), None, Some(3.0), Some(2.0), None], some(&[5.0, 5.0, 5.0, 5.0, 5.0])),
        (2, some(&[4.0, 3.0, 2.0, 1.0, 0.5]), vec![Some(1.0), Some(2.0), None, Some(2.0), Some(9.0)]),
        (3, some(&[1.0, 1.0, 2.0, 2.0, 3.0]), some(&[7.0, 6.0, 5.0, 4.0, 3.0])),
    ]);

    let outcome = PanelCleaner::new(config(3)).clean(&factor_names(), &panel).unwrap();
    let frame = outcome.panel.frame();

    for factor in outcome.factors.iter() {
        let values = frame.column(factor).unwrap().f64().unwrap();
        assert_eq!(values.null_count(), 0, "{factor} still has missing values");
        assert!(values.into_no_null_iter().all(|v| (-1.0..=1.0).contains(&v)));
    }
    assert_eq!(outcome.report.imputed_values, 3);

    // Entity 1's `g` is constant: every value normalizes to exactly 0
    let g_entity_1: Vec<f64> = frame
        .clone()
        .lazy()
        .filter(col("permno").eq(lit(1i64)))
        .collect()
        .unwrap()
        .column("g")
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert_eq!(g_entity_1, vec![0.0; 5]);
}

#[test]
fn test_single_observation_entity_normalizes_to_zero() {
    let panel = build_panel(&[
        (1, some(&[0.3]), some(&[0.7])),
        (2, some(&[1.0, 2.0]), some(&[3.0, 4.0])),
    ]);

    let outcome = PanelCleaner::new(config(1)).clean(&factor_names(), &panel).unwrap();
    let single = outcome
        .panel
        .frame()
        .clone()
        .lazy()
        .filter(col("permno").eq(lit(1i64)))
        .collect()
        .unwrap();

    for factor in ["f", "g"] {
        let v = single.column(factor).unwrap().f64().unwrap().get(0).unwrap();
        assert_eq!(v, 0.0);
    }
    assert!(outcome.report.constant_series_values >= 2);
}

#[test]
fn test_all_missing_entity_is_dropped_before_coverage() {
    let panel = build_panel(&[
        (1, vec![None, None, None], some(&[1.0, 2.0, 3.0])),
        (2, some(&[1.0, 2.0, 3.0]), some(&[1.0, 2.0, 3.0])),
        (3, some(&[1.0, 2.0, 3.0]), some(&[1.0, 2.0, 3.0])),
        (4, some(&[1.0, 2.0, 3.0]), some(&[1.0, 2.0, 3.0])),
        (5, some(&[1.0, 2.0, 3.0]), some(&[1.0, 2.0, 3.0])),
        (6, some(&[1.0, 2.0, 3.0]), some(&[1.0, 2.0, 3.0])),
        (7, some(&[1.0, 2.0, 3.0]), some(&[1.0, 2.0, 3.0])),
        (8, some(&[1.0, 2.0, 3.0]), some(&[1.0, 2.0, 3.0])),
        (9, some(&[1.0]), some(&[1.0])),
    ]);

    let outcome = PanelCleaner::new(config(3)).clean(&factor_names(), &panel).unwrap();
    assert_eq!(outcome.report.incomplete_entities, 1);
    assert_eq!(outcome.report.short_entities, 1);
    assert_eq!(outcome.panel.entity_ids().unwrap(), vec![2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn test_input_panel_is_not_modified() {
    let panel = build_panel(&[
        (1, vec![Some(1.0), None, Some(3.0)], some(&[1.0, 2.0, 3.0])),
        (2, some(&[1.0, 2.0, 3.0]), some(&[1.0, 2.0, 3.0])),
    ]);
    let before = panel.frame().clone();
    let _ = PanelCleaner::new(config(1)).clean(&factor_names(), &panel).unwrap();
    assert!(panel.frame().equals_missing(&before));
}

#[rstest]
#[case(4, "coverage")]
fn test_degenerate_entities(#[case] months: usize, #[case] stage: &str) {
    let panel = build_panel(&[(1, some(&[1.0, 2.0, 3.0]), some(&[1.0, 2.0, 3.0]))]);
    match PanelCleaner::new(config(months)).clean(&factor_names(), &panel) {
        Err(CleanError::NoEntities { stage: s }) => assert_eq!(s, stage),
        other => panic!("expected NoEntities, got {other:?}"),
    }
}

#[test]
fn test_degenerate_factors() {
    let panel = build_panel(&[(1, vec![None, None, Some(1.0)], some(&[0.0, 0.0, 1.0]))]);
    assert!(matches!(
        PanelCleaner::new(config(1)).clean(&factor_names(), &panel),
        Err(CleanError::NoFactors { candidates: 2 })
    ));
}

#[test]
fn test_output_columns() {
    let panel = build_panel(&[
        (1, some(&[1.0, 2.0]), some(&[3.0, 4.0])),
        (2, some(&[5.0, 6.0]), some(&[7.0, 8.0])),
    ]);
    let outcome = PanelCleaner::new(config(2)).clean(&factor_names(), &panel).unwrap();
    assert_eq!(
        outcome.panel.column_names(),
        vec!["year", "month", "date", "permno", "comp_name", "stock_exret", "f", "g"]
    );
}
