//! Panel cleaning pipeline.
//!
//! Steps run in a fixed order, each on the output of the previous one:
//! factor filtering on the full panel, completeness and coverage filters on
//! stocks, per-stock median imputation, then per-stock rank normalization.

use crate::config::CleanConfig;
use crate::error::{CleanError, Result};
use crate::filter::{drop_incomplete_entities, factor_counts, keep_covered_entities, select_factors};
use crate::impute::impute_medians;
use crate::normalize::rank_normalize;
use montreal_data::schema::{DATE, ENTITY, TARGET, entity_column, present_identifying, require_columns};
use montreal_data::{FactorList, Panel};
use polars::prelude::*;
use std::collections::HashSet;
use tracing::info;

/// Row and entity counts through each stage, plus numeric guard counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Rows of the input panel
    pub input_rows: usize,
    /// Entities of the input panel
    pub input_entities: usize,
    /// Factors considered
    pub candidate_factors: usize,
    /// Factors kept by the missing/zero filter
    pub retained_factors: usize,
    /// Entities dropped for a factor missing on all of their rows
    pub incomplete_entities: usize,
    /// Entities dropped for insufficient months
    pub short_entities: usize,
    /// Rows of the output panel
    pub output_rows: usize,
    /// Entities of the output panel
    pub output_entities: usize,
    /// Missing values filled with an entity median
    pub imputed_values: usize,
    /// Values set to 0 because the entity median was undefined
    pub undefined_medians: usize,
    /// Values set to 0 because the entity's factor series was constant
    pub constant_series_values: usize,
}

/// Result of a cleaning run.
#[derive(Debug, Clone)]
pub struct CleanOutcome {
    /// Factors that survived filtering, in input order
    pub factors: FactorList,
    /// Filtered, imputed and normalized panel
    pub panel: Panel,
    /// Stage counters
    pub report: CleanReport,
}

/// Cleans raw panels with a fixed set of thresholds.
#[derive(Debug, Clone, Default)]
pub struct PanelCleaner {
    config: CleanConfig,
}

impl PanelCleaner {
    /// Create a cleaner with the given thresholds.
    pub const fn new(config: CleanConfig) -> Self {
        Self { config }
    }

    /// Thresholds in use.
    pub const fn config(&self) -> &CleanConfig {
        &self.config
    }

    /// Clean `panel` restricted to `factor_names`.
    ///
    /// The input panel is not modified. Fails with [`CleanError::NoFactors`] or
    /// [`CleanError::NoEntities`] rather than returning an empty table.
    pub fn clean(&self, factor_names: &[String], panel: &Panel) -> Result<CleanOutcome> {
        self.config.validate()?;
        let raw = panel.frame();
        require_columns(raw, &[ENTITY, DATE, TARGET])?;
        require_columns(raw, factor_names)?;

        let identifying = present_identifying(raw);
        let candidates: Vec<String> = factor_names
            .iter()
            .filter(|f| !identifying.contains(&f.as_str()))
            .cloned()
            .collect();

        let mut report = CleanReport {
            input_rows: raw.height(),
            input_entities: count_entities(raw)?,
            candidate_factors: candidates.len(),
            ..Default::default()
        };

        // Factor survivorship is fixed here, on the full panel
        let frame = as_float_factors(raw, &identifying, &candidates)?;
        let counts = factor_counts(&frame, &candidates)?;
        let retained = select_factors(
            &counts,
            frame.height(),
            self.config.missing_threshold,
            self.config.zero_threshold,
        );
        report.retained_factors = retained.len();
        info!(
            candidates = candidates.len(),
            retained = retained.len(),
            "Selected factors by missing/zero fractions"
        );
        if retained.is_empty() {
            return Err(CleanError::NoFactors {
                candidates: candidates.len(),
            });
        }

        let mut keep: Vec<&str> = identifying.clone();
        keep.extend(retained.iter().map(String::as_str));
        let frame = frame.select(keep.iter().copied())?;

        let complete = drop_incomplete_entities(frame.lazy(), &retained).collect()?;
        let complete_entities = count_entities(&complete)?;
        report.incomplete_entities = report.input_entities - complete_entities;
        if complete_entities == 0 {
            return Err(CleanError::NoEntities {
                stage: "completeness",
            });
        }

        let covered = keep_covered_entities(complete.lazy(), self.config.months_threshold).collect()?;
        let covered_entities = count_entities(&covered)?;
        report.short_entities = complete_entities - covered_entities;
        info!(
            incomplete = report.incomplete_entities,
            short = report.short_entities,
            remaining = covered_entities,
            months_threshold = self.config.months_threshold,
            "Filtered stocks"
        );
        if covered_entities == 0 {
            return Err(CleanError::NoEntities { stage: "coverage" });
        }

        let (imputed, impute_counts) = impute_medians(covered, &retained)?;
        report.imputed_values = impute_counts.imputed;
        report.undefined_medians = impute_counts.undefined_medians;

        let (normalized, constant) = rank_normalize(imputed, &retained)?;
        report.constant_series_values = constant;
        report.output_rows = normalized.height();
        report.output_entities = covered_entities;

        let factors = FactorList::new(retained)?;
        let panel = Panel::new(normalized)?;
        info!(
            rows = report.output_rows,
            entities = report.output_entities,
            factors = factors.len(),
            imputed = report.imputed_values,
            "Cleaned panel"
        );

        Ok(CleanOutcome {
            factors,
            panel,
            report,
        })
    }
}

/// Clean with explicit thresholds, returning only the factor list and panel.
pub fn clean(
    factor_names: &[String],
    panel: &Panel,
    config: CleanConfig,
) -> Result<(FactorList, Panel)> {
    let outcome = PanelCleaner::new(config).clean(factor_names, panel)?;
    Ok((outcome.factors, outcome.panel))
}

/// Identifying columns plus factors cast to `Float64`, with NaN treated as missing.
fn as_float_factors(
    raw: &DataFrame,
    identifying: &[&str],
    factors: &[String],
) -> Result<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(identifying.len() + factors.len());
    for name in identifying {
        columns.push(raw.column(name)?.clone());
    }
    for name in factors {
        let values = raw.column(name)?.cast(&DataType::Float64)?;
        let cleaned: Float64Chunked = values
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        columns.push(Column::from(cleaned.with_name(name.as_str().into()).into_series()));
    }
    Ok(DataFrame::new(columns)?)
}

fn count_entities(frame: &DataFrame) -> Result<usize> {
    let ids: HashSet<i64> = entity_column(frame)?.into_iter().collect();
    Ok(ids.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifying_columns_are_not_factors() {
        let df = df![
            "permno" => [1i64, 1],
            "date" => ["2020-01-31", "2020-02-29"],
            "stock_exret" => [0.1, 0.2],
            "x" => [1.0, 2.0]
        ]
        .unwrap();
        let panel = Panel::new(df).unwrap();
        let config = CleanConfig {
            months_threshold: 1,
            ..Default::default()
        };

        let names = vec!["stock_exret".to_string(), "x".to_string()];
        let outcome = PanelCleaner::new(config).clean(&names, &panel).unwrap();
        assert_eq!(outcome.factors.names(), vec!["x".to_string()]);
        assert_eq!(outcome.report.candidate_factors, 1);
    }

    #[test]
    fn test_nan_counts_as_missing() {
        let df = df![
            "permno" => [1i64, 1, 1, 1],
            "date" => ["d1", "d2", "d3", "d4"],
            "stock_exret" => [0.1, 0.2, 0.3, 0.4],
            "x" => [f64::NAN, f64::NAN, 1.0, 2.0]
        ]
        .unwrap();
        let panel = Panel::new(df).unwrap();

        let err = clean(&["x".to_string()], &panel, CleanConfig::default()).unwrap_err();
        assert!(matches!(err, CleanError::NoFactors { candidates: 1 }));
    }
}
