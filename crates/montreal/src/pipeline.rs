//! Stage orchestration. Every stage reads its inputs from and writes its
//! outputs to the locations in [`PathsConfig`].

use crate::config::{MontrealConfig, PathsConfig};
use crate::error::{PipelineError, Result};
use crate::external::run_prediction;
use montreal_clean::{
    CleanOutcome, CleanReport, CoverageBucket, PanelCleaner, coverage_histogram, missing_counts,
    zero_counts,
};
use montreal_data::{
    FactorList, Panel, load_benchmark, load_factor_list, load_panel, load_predictions, read_table,
    save_panel, write_table,
};
use montreal_output::{ExportFormat, Exporter, PerformanceReport, top_holdings};
use montreal_portfolio::{Evaluation, PortfolioEngine};
use montreal_selection::{FactorSelection, PathChoice, SelectionOutcome};
use polars::prelude::DataFrame;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

/// Pipeline stages in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Factor and stock filtering, imputation, normalization
    Clean,
    /// Ensemble and deep-elimination feature selection
    Select,
    /// External prediction command
    Predict,
    /// Portfolio search, statistics and reports
    Evaluate,
}

impl Stage {
    /// Every stage, in order.
    pub const ALL: [Self; 4] = [Self::Clean, Self::Select, Self::Predict, Self::Evaluate];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Clean => "clean",
            Self::Select => "select",
            Self::Predict => "predict",
            Self::Evaluate => "evaluate",
        };
        f.write_str(name)
    }
}

/// Exploratory counts over the raw panel.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    /// Rows in the raw panel
    pub rows: usize,
    /// Factors with missing values, most missing first
    pub missing: Vec<(String, usize)>,
    /// Factors with exact zeros, most zeros first
    pub zeros: Vec<(String, usize)>,
    /// Entities per count of available months
    pub coverage: Vec<CoverageBucket>,
}

/// Files written by [`Pipeline::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFiles {
    /// Pretty JSON report
    pub report: PathBuf,
    /// Top holdings CSV
    pub holdings: PathBuf,
    /// Sharpe ratio per searched size
    pub size_search: PathBuf,
    /// Monthly performance series, compounded when a benchmark was available
    pub performance: PathBuf,
    /// Final portfolio rows
    pub portfolio: PathBuf,
}

impl ReportFiles {
    fn new(paths: &PathsConfig, model: &str) -> Self {
        let dir = &paths.report_dir;
        Self {
            report: dir.join(format!("{model}_report.json")),
            holdings: dir.join(format!("{model}_top_holdings.csv")),
            size_search: dir.join(format!("{model}_size_search.csv")),
            performance: dir.join(format!("{model}_performance.csv")),
            portfolio: dir.join(format!("{model}_portfolio.csv")),
        }
    }
}

/// Result of [`Pipeline::evaluate`].
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    /// Full portfolio evaluation
    pub evaluation: Evaluation,
    /// Report with top holdings attached
    pub report: PerformanceReport,
    /// Where everything was written
    pub files: ReportFiles,
}

/// What a full run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Cleaning counters
    pub clean: CleanReport,
    /// Persisted factor selection
    pub selected: FactorList,
    /// Which selection path won
    pub choice: PathChoice,
    /// Final performance report
    pub report: PerformanceReport,
}

/// The four-stage research pipeline.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: MontrealConfig,
}

impl Pipeline {
    /// New pipeline over `config`.
    pub const fn new(config: MontrealConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub const fn config(&self) -> &MontrealConfig {
        &self.config
    }

    fn paths(&self) -> &PathsConfig {
        &self.config.paths
    }

    /// Raw panel and the candidate factors that are columns of it.
    ///
    /// Listed factors absent from the panel are skipped with a warning.
    pub fn load_raw(&self) -> Result<(Vec<String>, Panel)> {
        let paths = self.paths();
        let listed = load_factor_list(&paths.raw_factors)?.into_inner();
        let panel = Panel::new(read_table(&paths.raw_data, true)?)?;

        let columns = panel.column_names();
        let (candidates, absent): (Vec<String>, Vec<String>) =
            listed.into_iter().partition(|f| columns.contains(f));
        if !absent.is_empty() {
            warn!(absent = ?absent, "Listed factors missing from the raw panel");
        }
        info!(
            rows = panel.height(),
            candidates = candidates.len(),
            "Loaded raw panel"
        );
        Ok((candidates, panel))
    }

    /// Missing, zero and coverage counts of the raw panel.
    pub fn diagnose(&self) -> Result<Diagnostics> {
        let (candidates, panel) = self.load_raw()?;
        Ok(Diagnostics {
            rows: panel.height(),
            missing: missing_counts(panel.frame(), &candidates)?,
            zeros: zero_counts(panel.frame(), &candidates)?,
            coverage: coverage_histogram(panel.frame())?,
        })
    }

    /// Clean the raw panel and persist the clean pair.
    pub fn clean(&self) -> Result<CleanOutcome> {
        let (candidates, raw) = self.load_raw()?;
        let outcome = PanelCleaner::new(self.config.cleaning).clean(&candidates, &raw)?;
        let files = self.paths().clean_files();
        save_panel(&files, &outcome.factors, &outcome.panel)?;
        info!(
            factors = outcome.factors.len(),
            rows = outcome.panel.height(),
            data = %files.data_file.display(),
            "Saved cleaned panel"
        );
        Ok(outcome)
    }

    /// Select factors from the clean pair and persist the selected pair.
    pub fn select(&self) -> Result<SelectionOutcome> {
        let (factors, panel) = load_panel(&self.paths().clean_files())?;
        let outcome = FactorSelection::new(self.config.selection.clone()).run(&factors, &panel)?;
        let files = self.paths().selected_files();
        save_panel(&files, &outcome.result.factors, &outcome.result.panel)?;
        info!(
            selected = outcome.result.factors.len(),
            path = %outcome.choice.chosen,
            data = %files.data_file.display(),
            "Saved selected panel"
        );
        Ok(outcome)
    }

    /// Run the external prediction stage on the selected pair.
    pub fn predict(&self) -> Result<DataFrame> {
        let files = self.paths().selected_files();
        if !files.data_file.exists() {
            return Err(PipelineError::ExternalStage {
                reason: format!(
                    "selected panel {} does not exist; run selection first",
                    files.data_file.display()
                ),
            });
        }
        run_prediction(&self.config.prediction, self.paths())
    }

    /// Evaluate the configured model's predictions and write the reports.
    pub fn evaluate(&self) -> Result<EvaluationOutcome> {
        let paths = self.paths();
        let portfolio = &self.config.portfolio;
        let predictions = load_predictions(paths.predictions_file(), &[&portfolio.model])?;

        let benchmark = if paths.benchmark.exists() {
            Some(load_benchmark(&paths.benchmark, &portfolio.benchmark_column)?)
        } else {
            warn!(
                path = %paths.benchmark.display(),
                "Benchmark file not found, skipping cumulative comparison"
            );
            None
        };

        let evaluation = PortfolioEngine::new(portfolio.clone())
            .evaluate(&predictions, benchmark.as_ref())?;

        let names = self.name_table(&predictions)?;
        let holdings = top_holdings(&evaluation.portfolio, &names, portfolio.top_holdings)?;
        let report =
            PerformanceReport::from_evaluation(&portfolio.model, &evaluation)?.with_holdings(holdings);

        let files = ReportFiles::new(paths, &portfolio.model);
        report.export_to_file(&files.report, ExportFormat::PrettyJson)?;
        report
            .top_holdings
            .export_to_file(&files.holdings, ExportFormat::Csv)?;
        evaluation
            .search
            .scores
            .export_to_file(&files.size_search, ExportFormat::Csv)?;
        write_table(
            &files.performance,
            evaluation.cumulative.as_ref().unwrap_or(&evaluation.performance),
        )?;
        write_table(&files.portfolio, &evaluation.portfolio)?;
        info!(
            report = %files.report.display(),
            sharpe = ?report.sharpe,
            size = report.best_size,
            "Wrote evaluation reports"
        );

        Ok(EvaluationOutcome {
            evaluation,
            report,
            files,
        })
    }

    /// Company names come from the cleaned panel when it exists.
    fn name_table(&self, predictions: &DataFrame) -> Result<DataFrame> {
        let data = self.paths().clean_files().data_file;
        if data.exists() {
            Ok(read_table(&data, true)?)
        } else {
            warn!(
                path = %data.display(),
                "Cleaned panel not found, holdings will have no names"
            );
            Ok(predictions.clone())
        }
    }

    /// Every stage in order.
    pub fn run(&self) -> Result<RunSummary> {
        self.run_with(|_| {})
    }

    /// Every stage in order, calling `on_stage` before each one starts.
    pub fn run_with(&self, mut on_stage: impl FnMut(Stage)) -> Result<RunSummary> {
        self.config.validate()?;

        on_stage(Stage::Clean);
        let clean = self.clean()?.report;

        on_stage(Stage::Select);
        let selection = self.select()?;

        on_stage(Stage::Predict);
        self.predict()?;

        on_stage(Stage::Evaluate);
        let evaluated = self.evaluate()?;

        Ok(RunSummary {
            clean,
            selected: selection.result.factors,
            choice: selection.choice,
            report: evaluated.report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_and_names() {
        let names: Vec<String> = Stage::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["clean", "select", "predict", "evaluate"]);
    }

    #[test]
    fn test_report_file_names() {
        let files = ReportFiles::new(&PathsConfig::default(), "xgb");
        assert_eq!(files.report, PathBuf::from("reports/xgb_report.json"));
        assert_eq!(files.holdings, PathBuf::from("reports/xgb_top_holdings.csv"));
    }

    #[test]
    fn test_predict_requires_selected_panel() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = MontrealConfig::default();
        config.paths = config.paths.resolve(dir.path());
        assert!(matches!(
            Pipeline::new(config).predict(),
            Err(PipelineError::ExternalStage { .. })
        ));
    }
}
