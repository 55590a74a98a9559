//! Cleaning thresholds.

use crate::error::{CleanError, Result};
use serde::{Deserialize, Serialize};

/// Thresholds applied by the [`PanelCleaner`](crate::PanelCleaner).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    /// Keep a factor only if its missing fraction is below this (default: 0.30)
    pub missing_threshold: f64,
    /// Keep a factor only if its exactly-zero fraction is below this (default: 0.20)
    pub zero_threshold: f64,
    /// Keep a stock only if it has at least this many distinct dates (default: 100)
    pub months_threshold: usize,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            missing_threshold: 0.30,
            zero_threshold: 0.20,
            months_threshold: 100,
        }
    }
}

impl CleanConfig {
    /// Check that both fractions lie in (0, 1].
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("missing_threshold", self.missing_threshold),
            ("zero_threshold", self.zero_threshold),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(CleanError::InvalidThreshold { name, value });
            }
        }
        Ok(())
    }
}
