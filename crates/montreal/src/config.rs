//! TOML configuration: file locations plus the settings of every stage.

use crate::error::{PipelineError, Result};
use montreal_clean::CleanConfig;
use montreal_data::PanelFiles;
use montreal_portfolio::PortfolioConfig;
use montreal_selection::SelectionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "montreal.toml";

/// File name the external prediction stage must write.
pub const PREDICTIONS_FILE: &str = "output.csv";

/// Full pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MontrealConfig {
    /// Input and output locations
    pub paths: PathsConfig,
    /// Panel cleaning thresholds
    pub cleaning: CleanConfig,
    /// Feature selection settings
    pub selection: SelectionConfig,
    /// External prediction command
    pub prediction: PredictionConfig,
    /// Portfolio construction and evaluation
    pub portfolio: PortfolioConfig,
}

/// Where every stage reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Raw monthly panel
    pub raw_data: PathBuf,
    /// Candidate factor list (`variable` column)
    pub raw_factors: PathBuf,
    /// Market index file with the benchmark return
    pub benchmark: PathBuf,
    /// Cleaned and selected panels
    pub clean_dir: PathBuf,
    /// Output directory of the prediction stage
    pub predictions_dir: PathBuf,
    /// Reports and holdings
    pub report_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_data: PathBuf::from("asset/hackathon_sample_v2.csv"),
            raw_factors: PathBuf::from("asset/factor_char_list.csv"),
            benchmark: PathBuf::from("asset/mkt_ind.csv"),
            clean_dir: PathBuf::from("clean_data"),
            predictions_dir: PathBuf::from("predictions"),
            report_dir: PathBuf::from("reports"),
        }
    }
}

impl PathsConfig {
    /// Every path resolved against `base`; absolute paths are kept.
    pub fn resolve(&self, base: &Path) -> Self {
        let join = |p: &PathBuf| base.join(p);
        Self {
            raw_data: join(&self.raw_data),
            raw_factors: join(&self.raw_factors),
            benchmark: join(&self.benchmark),
            clean_dir: join(&self.clean_dir),
            predictions_dir: join(&self.predictions_dir),
            report_dir: join(&self.report_dir),
        }
    }

    /// Cleaned panel pair.
    pub fn clean_files(&self) -> PanelFiles {
        PanelFiles::clean(&self.clean_dir)
    }

    /// Selected panel pair.
    pub fn selected_files(&self) -> PanelFiles {
        PanelFiles::selected(&self.clean_dir)
    }

    /// Predictions file written by the external stage.
    pub fn predictions_file(&self) -> PathBuf {
        self.predictions_dir.join(PREDICTIONS_FILE)
    }
}

/// External prediction command.
///
/// `args` may reference `{work_dir}`, `{data}`, `{factor}` and `{output_dir}`:
/// the clean directory, the selected data and factor file names inside it, and
/// the predictions directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Program to launch
    pub program: String,
    /// Argument template
    pub args: Vec<String>,
    /// Score columns the predictions file must contain
    pub models: Vec<String>,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: [
                "predict_data.py",
                "--data={data}",
                "--factor={factor}",
                "--work_dir={work_dir}",
                "--output_dir={output_dir}",
            ]
            .map(String::from)
            .to_vec(),
            models: vec!["xgb".to_string()],
        }
    }
}

impl MontrealConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| PipelineError::io(path, e))?;
        Ok(())
    }

    /// Default configuration rendered as TOML, for `init-config`.
    pub fn example() -> Result<String> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        self.cleaning.validate()?;
        self.selection.validate()?;
        self.portfolio.validate()?;
        if self.prediction.program.trim().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "prediction.program is empty".into(),
            ));
        }
        if !self
            .prediction
            .models
            .iter()
            .any(|m| *m == self.portfolio.model)
        {
            return Err(PipelineError::InvalidConfig(format!(
                "portfolio.model '{}' is not one of prediction.models {:?}",
                self.portfolio.model, self.prediction.models
            )));
        }
        Ok(())
    }
}
