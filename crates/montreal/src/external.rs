//! The opaque prediction stage: an external command and the file it must leave behind.

use crate::config::{PathsConfig, PredictionConfig};
use crate::error::{PipelineError, Result};
use montreal_data::market::PREDICTION_COLUMNS;
use montreal_data::{DataError, load_predictions};
use polars::prelude::DataFrame;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info, warn};

/// Substitute `{name}` placeholders in every argument.
pub fn render_args(template: &[String], vars: &[(&str, String)]) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            vars.iter().fold(arg.clone(), |acc, (name, value)| {
                acc.replace(&format!("{{{name}}}"), value)
            })
        })
        .collect()
}

/// Placeholder values for a run over `paths`.
pub fn template_vars(paths: &PathsConfig) -> Vec<(&'static str, String)> {
    let files = paths.selected_files();
    let file_name = |p: &Path| {
        p.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    vec![
        ("work_dir", paths.clean_dir.display().to_string()),
        ("data", file_name(&files.data_file)),
        ("factor", file_name(&files.factor_file)),
        ("output_dir", paths.predictions_dir.display().to_string()),
    ]
}

/// Launch the prediction command and validate the predictions file it writes.
pub fn run_prediction(config: &PredictionConfig, paths: &PathsConfig) -> Result<DataFrame> {
    std::fs::create_dir_all(&paths.predictions_dir)
        .map_err(|e| PipelineError::io(&paths.predictions_dir, e))?;

    let args = render_args(&config.args, &template_vars(paths));
    info!(program = %config.program, args = ?args, "Launching prediction stage");

    let output = Command::new(&config.program)
        .args(&args)
        .output()
        .map_err(|e| PipelineError::ExternalStage {
            reason: format!("failed to launch '{}': {e}", config.program),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        debug!(stdout = %stdout.trim(), "Prediction stage output");
    }
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(stderr = %stderr.trim(), "Prediction stage failed");
        return Err(PipelineError::ExternalStage {
            reason: format!("'{}' exited with {}", config.program, output.status),
        });
    }

    validate_predictions(&paths.predictions_file(), &config.models)
}

/// Load a predictions file, mapping a wrong schema to [`PipelineError::ExternalSchema`].
pub fn validate_predictions(path: &Path, models: &[String]) -> Result<DataFrame> {
    if !path.exists() {
        return Err(PipelineError::ExternalStage {
            reason: format!("no predictions file at {}", path.display()),
        });
    }
    match load_predictions(path, models) {
        Ok(frame) => {
            info!(rows = frame.height(), models = ?models, "Predictions validated");
            Ok(frame)
        }
        Err(DataError::MissingColumns { actual, .. }) => Err(PipelineError::ExternalSchema {
            expected: PREDICTION_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .chain(models.iter().cloned())
                .collect(),
            actual,
        }),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_render_args() {
        let template = vec![
            "run.py".to_string(),
            "--data={data}".to_string(),
            "{work_dir}/{factor}".to_string(),
            "--keep={unknown}".to_string(),
        ];
        let vars = vec![
            ("data", "selected_data.csv".to_string()),
            ("factor", "selected_factor.csv".to_string()),
            ("work_dir", "clean_data".to_string()),
        ];
        assert_eq!(
            render_args(&template, &vars),
            vec![
                "run.py",
                "--data=selected_data.csv",
                "clean_data/selected_factor.csv",
                "--keep={unknown}",
            ]
        );
    }

    #[test]
    fn test_template_vars_use_selected_pair() {
        let paths = PathsConfig {
            clean_dir: PathBuf::from("work/clean"),
            predictions_dir: PathBuf::from("work/pred"),
            ..Default::default()
        };
        let vars = template_vars(&paths);
        assert!(vars.contains(&("data", "selected_data.csv".to_string())));
        assert!(vars.contains(&("factor", "selected_factor.csv".to_string())));
        assert!(vars.contains(&("output_dir", "work/pred".to_string())));
    }

    #[test]
    fn test_missing_program_is_an_external_failure() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathsConfig::default().resolve(dir.path());
        let config = PredictionConfig {
            program: "montreal-no-such-program".into(),
            args: vec![],
            models: vec!["xgb".into()],
        };
        assert!(matches!(
            run_prediction(&config, &paths),
            Err(PipelineError::ExternalStage { .. })
        ));
    }

    #[test]
    fn test_schema_mismatch_lists_expected_and_actual() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.csv");
        std::fs::write(&path, "date,permno,stock_exret,lasso\n2020-01-31,1,0.01,0.5\n").unwrap();

        match validate_predictions(&path, &["xgb".to_string()]) {
            Err(PipelineError::ExternalSchema { expected, actual }) => {
                assert_eq!(expected, vec!["date", "permno", "stock_exret", "xgb"]);
                assert_eq!(actual, vec!["date", "permno", "stock_exret", "lasso"]);
            }
            other => panic!("expected a schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_an_external_failure() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            validate_predictions(&dir.path().join("output.csv"), &["xgb".to_string()]),
            Err(PipelineError::ExternalStage { .. })
        ));
    }
}
