//! Performance report for one model's evaluation.

use crate::holdings::Holding;
use chrono::{DateTime, Utc};
use montreal_portfolio::{CUMULATIVE_BENCHMARK, CUMULATIVE_PORTFOLIO, Evaluation, SizeScore};
use polars::prelude::{DataFrame, PolarsError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error while reading the evaluation frames.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Headline results of a portfolio evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Model whose scores built the portfolio.
    pub model: String,

    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Portfolio size chosen by the search.
    pub best_size: usize,

    /// Annualized Sharpe ratio of the final portfolio.
    pub sharpe: Option<f64>,

    /// Compounded annual return.
    pub annualized_return: f64,

    /// Annualized standard deviation.
    pub annualized_std: f64,

    /// Months in the evaluation.
    pub months: usize,

    /// Last value of the compounded portfolio series.
    pub final_cumulative_portfolio: Option<f64>,

    /// Last value of the compounded benchmark series.
    pub final_cumulative_benchmark: Option<f64>,

    /// Sharpe ratio of every searched size.
    pub size_scores: Vec<SizeScore>,

    /// Most frequently held stocks.
    pub top_holdings: Vec<Holding>,
}

impl PerformanceReport {
    /// Summarise an evaluation; holdings start empty.
    pub fn from_evaluation(model: impl Into<String>, evaluation: &Evaluation) -> Result<Self, ReportError> {
        let (final_cumulative_portfolio, final_cumulative_benchmark) =
            match &evaluation.cumulative {
                Some(frame) => (
                    last_value(frame, CUMULATIVE_PORTFOLIO)?,
                    last_value(frame, CUMULATIVE_BENCHMARK)?,
                ),
                None => (None, None),
            };
        Ok(Self {
            model: model.into(),
            timestamp: Utc::now(),
            best_size: evaluation.search.best_size,
            sharpe: evaluation.stats.sharpe,
            annualized_return: evaluation.stats.annualized_return,
            annualized_std: evaluation.stats.annualized_std,
            months: evaluation.stats.months,
            final_cumulative_portfolio,
            final_cumulative_benchmark,
            size_scores: evaluation.search.scores.clone(),
            top_holdings: Vec::new(),
        })
    }

    /// Attach the top holdings.
    pub fn with_holdings(mut self, holdings: Vec<Holding>) -> Self {
        self.top_holdings = holdings;
        self
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Headline metrics as `(name, value)` pairs, in display order.
    pub fn metrics(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("best_size", Some(self.best_size as f64)),
            ("sharpe", self.sharpe),
            ("annualized_return", Some(self.annualized_return)),
            ("annualized_std", Some(self.annualized_std)),
            ("months", Some(self.months as f64)),
            ("final_cumulative_portfolio", self.final_cumulative_portfolio),
            ("final_cumulative_benchmark", self.final_cumulative_benchmark),
        ]
    }
}

fn last_value(frame: &DataFrame, column: &str) -> Result<Option<f64>, ReportError> {
    Ok(frame.column(column)?.f64()?.last())
}
