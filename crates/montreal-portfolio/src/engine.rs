//! Full evaluation of one model's predictions.

use crate::config::PortfolioConfig;
use crate::construct::{build_portfolio, filter_window};
use crate::error::{PortfolioError, Result};
use crate::performance::{PerformanceStats, cumulative_series, weighted_return};
use crate::search::{SizeSearch, search_best_size};
use polars::prelude::DataFrame;
use tracing::info;

/// Outputs of [`PortfolioEngine::evaluate`].
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Size search results
    pub search: SizeSearch,
    /// Final portfolio at the best size
    pub portfolio: DataFrame,
    /// Monthly performance series of the final portfolio
    pub performance: DataFrame,
    /// Headline statistics of `performance`
    pub stats: PerformanceStats,
    /// Performance joined with the benchmark and compounded, when a benchmark was given
    pub cumulative: Option<DataFrame>,
}

/// Window, size search, final portfolio and statistics for one model.
#[derive(Debug, Clone, Default)]
pub struct PortfolioEngine {
    config: PortfolioConfig,
}

impl PortfolioEngine {
    /// New engine.
    pub const fn new(config: PortfolioConfig) -> Self {
        Self { config }
    }

    /// Active settings.
    pub const fn config(&self) -> &PortfolioConfig {
        &self.config
    }

    /// Evaluate `predictions` (with year/month columns) for the configured model.
    pub fn evaluate(
        &self,
        predictions: &DataFrame,
        benchmark: Option<&DataFrame>,
    ) -> Result<Evaluation> {
        self.config.validate()?;
        let config = &self.config;

        let window = filter_window(predictions, config.evaluation_start, config.evaluation_end)?;
        if window.height() == 0 {
            return Err(PortfolioError::EmptySeries(format!(
                "no predictions between {:?} and {:?}",
                config.evaluation_start, config.evaluation_end
            )));
        }

        let (low, high) = config.portfolio_size_search_range;
        let search = search_best_size(&window, &config.model, low, high, config.long_short_split)?;

        let portfolio = build_portfolio(
            &window,
            &config.model,
            search.best_size,
            config.long_short_split,
        )?;
        let performance = weighted_return(&portfolio)?;
        let stats = PerformanceStats::from_series(&performance)?;
        info!(
            model = %config.model,
            size = search.best_size,
            sharpe = ?stats.sharpe,
            annualized_return = stats.annualized_return,
            annualized_std = stats.annualized_std,
            "Final portfolio"
        );

        let cumulative = benchmark
            .map(|b| cumulative_series(&performance, b, &config.benchmark_column))
            .transpose()?;

        Ok(Evaluation {
            search,
            portfolio,
            performance,
            stats,
            cumulative,
        })
    }
}
