//! Portfolio evaluation settings.

use crate::error::{PortfolioError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Settings for the [`PortfolioEngine`](crate::PortfolioEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    /// Score column of the predictions file (default: `xgb`)
    pub model: String,
    /// Fraction of each portfolio held long (default: 0.7)
    pub long_short_split: f64,
    /// Inclusive (low, high) bounds of the portfolio size search (default: 50..=100)
    pub portfolio_size_search_range: (usize, usize),
    /// First prediction date kept (default: 2010-01-01)
    pub evaluation_start: Option<NaiveDate>,
    /// Last prediction date kept (default: 2023-12-31)
    pub evaluation_end: Option<NaiveDate>,
    /// Benchmark return column of the market file (default: `sp_ret`)
    pub benchmark_column: String,
    /// Number of most frequently held stocks to report (default: 10)
    pub top_holdings: usize,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            model: "xgb".to_string(),
            long_short_split: 0.7,
            portfolio_size_search_range: (50, 100),
            evaluation_start: NaiveDate::from_ymd_opt(2010, 1, 1),
            evaluation_end: NaiveDate::from_ymd_opt(2023, 12, 31),
            benchmark_column: "sp_ret".to_string(),
            top_holdings: 10,
        }
    }
}

impl PortfolioConfig {
    /// Check the split, the size range and the evaluation window.
    pub fn validate(&self) -> Result<()> {
        check_split(self.long_short_split)?;
        let (low, high) = self.portfolio_size_search_range;
        check_range(low, high)?;
        if let (Some(start), Some(end)) = (self.evaluation_start, self.evaluation_end)
            && start > end
        {
            return Err(PortfolioError::InvalidParameter(format!(
                "evaluation window starts {start} after it ends {end}"
            )));
        }
        Ok(())
    }
}

pub(crate) fn check_split(split: f64) -> Result<()> {
    if (0.0..=1.0).contains(&split) {
        Ok(())
    } else {
        Err(PortfolioError::InvalidParameter(format!(
            "long_short_split must be in [0, 1], got {split}"
        )))
    }
}

pub(crate) fn check_range(low: usize, high: usize) -> Result<()> {
    if low == 0 || low > high {
        return Err(PortfolioError::InvalidParameter(format!(
            "portfolio size range [{low}, {high}] must be non-empty and start above 0"
        )));
    }
    Ok(())
}
