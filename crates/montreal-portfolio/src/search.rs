//! Exhaustive, parallel search for the portfolio size with the best Sharpe ratio.

use crate::config::check_range;
use crate::construct::build_portfolio;
use crate::error::{PortfolioError, Result};
use crate::performance::{sharpe, weighted_return};
use polars::prelude::DataFrame;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Sharpe ratio of one candidate size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeScore {
    /// Portfolio size (long + short)
    pub size: usize,
    /// Sharpe ratio, `None` when undefined
    pub sharpe: Option<f64>,
}

/// Result of [`search_best_size`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeSearch {
    /// Winning size
    pub best_size: usize,
    /// Its Sharpe ratio
    pub best_sharpe: f64,
    /// Every evaluated size, ascending
    pub scores: Vec<SizeScore>,
}

/// Highest defined Sharpe; ties keep the smaller size.
pub fn best_score(scores: &[SizeScore]) -> Option<(usize, f64)> {
    scores
        .iter()
        .filter_map(|s| s.sharpe.map(|v| (s.size, v)))
        .fold(None, |best: Option<(usize, f64)>, (size, value)| match best {
            Some((_, b)) if value <= b => best,
            _ => Some((size, value)),
        })
}

/// Build and score a portfolio for every size in `[low, high]`.
///
/// Sizes are evaluated on the rayon pool and reduced in ascending order, so the
/// result does not depend on scheduling: the strictly greatest Sharpe wins and
/// ties go to the smallest size. Sizes with an undefined Sharpe never win.
pub fn search_best_size(
    predictions: &DataFrame,
    model: &str,
    low: usize,
    high: usize,
    long_short_split: f64,
) -> Result<SizeSearch> {
    check_range(low, high)?;

    let scores: Vec<SizeScore> = (low..=high)
        .into_par_iter()
        .map(|size| {
            let portfolio = build_portfolio(predictions, model, size, long_short_split)?;
            let series = weighted_return(&portfolio)?;
            Ok(SizeScore {
                size,
                sharpe: sharpe(&series)?,
            })
        })
        .collect::<Result<_>>()?;

    let (best_size, best_sharpe) =
        best_score(&scores).ok_or(PortfolioError::NoDefinedSharpe { low, high })?;
    info!(
        low,
        high,
        best_size,
        best_sharpe,
        "Found best number of stocks"
    );
    Ok(SizeSearch {
        best_size,
        best_sharpe,
        scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(size: usize, sharpe: Option<f64>) -> SizeScore {
        SizeScore { size, sharpe }
    }

    #[test]
    fn test_ties_go_to_smallest_size() {
        let scores = [
            score(3, Some(0.5)),
            score(4, Some(1.2)),
            score(5, Some(1.2)),
            score(6, Some(0.9)),
        ];
        assert_eq!(best_score(&scores), Some((4, 1.2)));
    }

    /// Stock 1 always scores highest and returns 0.1, stock 4 always scores
    /// lowest and returns 0.0, so size 2 earns a flat 0.05 every month.
    fn flat_pair_predictions() -> DataFrame {
        use chrono::NaiveDate;
        use polars::prelude::*;

        let b = [0.02, -0.01, 0.03, 0.0, 0.05, 0.01];
        let c = [0.01, 0.03, -0.02, 0.02, 0.0, 0.04];
        let (mut month, mut date, mut permno, mut ret, mut score) =
            (vec![], vec![], vec![], vec![], vec![]);
        for (m, (rb, rc)) in (1u32..).zip(b.into_iter().zip(c)) {
            for (id, r, s) in [(1i64, 0.1, 0.9), (2, rb, 0.6), (3, rc, 0.4), (4, 0.0, 0.1)] {
                month.push(m as i32);
                date.push(NaiveDate::from_ymd_opt(2020, m, 28).unwrap());
                permno.push(id);
                ret.push(r);
                score.push(s);
            }
        }
        df![
            "year" => vec![2020i32; month.len()],
            "month" => month,
            "date" => date,
            "permno" => permno,
            "stock_exret" => ret,
            "xgb" => score
        ]
        .unwrap()
    }

    #[test]
    fn test_constant_returns_never_win_the_search() {
        let search = search_best_size(&flat_pair_predictions(), "xgb", 2, 4, 0.5).unwrap();
        assert_eq!(search.scores[0], score(2, None));
        assert_ne!(search.best_size, 2);
        assert!(search.best_sharpe.is_finite());
    }

    #[test]
    fn test_undefined_sharpe_never_wins() {
        let scores = [score(1, None), score(2, Some(-3.0)), score(3, None)];
        assert_eq!(best_score(&scores), Some((2, -3.0)));
        assert_eq!(best_score(&[score(1, None)]), None);
    }
}
