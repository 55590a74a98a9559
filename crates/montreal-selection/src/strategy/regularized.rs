//! Embedded strategy: keep features with a nonzero penalized coefficient.

use super::FeatureSelector;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::estimators::ElasticNetCv;
use crate::scaling::Scaler;
use tracing::debug;

/// Lasso or ElasticNet on standardized features, penalty chosen by 5-fold CV.
#[derive(Debug, Clone, PartialEq)]
pub struct RegularizedSelector {
    name: &'static str,
    /// Cross-validated model settings
    pub cv: ElasticNetCv,
}

impl RegularizedSelector {
    /// `l1_ratio = 1`.
    pub fn lasso() -> Self {
        Self {
            name: "Lasso",
            cv: ElasticNetCv::lasso(),
        }
    }

    /// `l1_ratio` in {0.1, 0.5, 0.9, 1}.
    pub fn elastic_net() -> Self {
        Self {
            name: "Elastic Net",
            cv: ElasticNetCv::elastic_net(),
        }
    }
}

impl FeatureSelector for RegularizedSelector {
    fn name(&self) -> &str {
        self.name
    }

    fn select(&self, data: &Dataset, _k: Option<usize>) -> Result<Vec<String>> {
        let x = Scaler::standard(&data.x).transform(&data.x);
        let fit = self.cv.fit(&x, &data.y)?;
        let support = fit.support();
        debug!(
            strategy = self.name,
            alpha = fit.alpha,
            l1_ratio = fit.l1_ratio,
            nonzero = support.len(),
            "Penalized fit"
        );
        Ok(support.into_iter().map(|j| data.features[j].clone()).collect())
    }
}
