//! Montreal CLI binary.
//!
//! Runs the cleaning, selection, prediction and evaluation stages one at a time
//! or end to end.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use montreal::clean::CleanReport;
use montreal::output::PerformanceReport;
use montreal::selection::SelectionOutcome;
use montreal::{CONFIG_FILE, MontrealConfig, Pipeline, Stage};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::{Level, warn};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "montreal")]
#[command(about = "Montreal: factor cleaning, selection and long/short backtesting", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file; defaults are used when it does not exist
    #[arg(short, long, default_value = CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter, impute and rank-normalize the raw panel
    Clean,

    /// Select factors from the cleaned panel
    Select,

    /// Run the external prediction command on the selected panel
    Predict,

    /// Search the portfolio size and evaluate the model's predictions
    Evaluate {
        /// Model score column to evaluate (overrides the config)
        #[arg(long)]
        model: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run every stage in order
    Run,

    /// Missing, zero and coverage counts of the raw panel
    Diagnose {
        /// Rows to show per table
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Write the default configuration
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    if let Commands::InitConfig { force } = cli.command {
        return init_config(&cli.config, force);
    }

    let mut config = load_config(&cli.config)?;
    match cli.command {
        Commands::Clean => {
            let outcome = Pipeline::new(config).clean()?;
            print_clean_report(&outcome.report);
        }
        Commands::Select => {
            let pb = spinner("Selecting factors...")?;
            let outcome = Pipeline::new(config).select();
            pb.finish_and_clear();
            print_selection(&outcome?);
        }
        Commands::Predict => {
            let pb = spinner("Waiting for the prediction command...")?;
            let predictions = Pipeline::new(config).predict();
            pb.finish_and_clear();
            println!("Predictions: {} rows", predictions?.height());
        }
        Commands::Evaluate { model, json } => {
            if let Some(model) = model {
                config.portfolio.model = model;
            }
            let pb = spinner("Searching portfolio size...")?;
            let outcome = Pipeline::new(config).evaluate();
            pb.finish_and_clear();
            let outcome = outcome?;
            if json {
                println!("{}", outcome.report.to_json()?);
            } else {
                print_report(&outcome.report);
                println!("Report written to {}", outcome.files.report.display());
            }
        }
        Commands::Run => run_all(config)?,
        Commands::Diagnose { top } => diagnose(config, top)?,
        Commands::InitConfig { .. } => {}
    }

    Ok(())
}

fn init_logging(verbose: u8) -> CliResult<()> {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| -> Box<dyn std::error::Error> { e })?;
    Ok(())
}

fn load_config(path: &Path) -> CliResult<MontrealConfig> {
    if path.exists() {
        Ok(MontrealConfig::load(path)?)
    } else {
        warn!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(MontrealConfig::default())
    }
}

fn init_config(path: &Path, force: bool) -> CliResult<()> {
    if path.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }
    MontrealConfig::default().save(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn spinner(message: &'static str) -> CliResult<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    Ok(pb)
}

fn run_all(config: MontrealConfig) -> CliResult<()> {
    let pb = ProgressBar::new(Stage::ALL.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg} [{elapsed}]")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let mut started = 0;
    let summary = Pipeline::new(config).run_with(|stage| {
        if started > 0 {
            pb.inc(1);
        }
        started += 1;
        pb.set_message(format!("Stage: {stage}"));
    });
    match summary {
        Ok(summary) => {
            pb.inc(1);
            pb.finish_with_message("Pipeline complete");
            print_clean_report(&summary.clean);
            println!(
                "Selected {} factors via {} (ensemble R² {:.4}, deep R² {:.4})",
                summary.selected.len(),
                summary.choice.chosen,
                summary.choice.ensemble_r2,
                summary.choice.deep_r2
            );
            print_report(&summary.report);
            Ok(())
        }
        Err(e) => {
            pb.abandon_with_message("Failed!");
            Err(e.into())
        }
    }
}

fn diagnose(config: MontrealConfig, top: usize) -> CliResult<()> {
    let diagnostics = Pipeline::new(config).diagnose()?;

    header("RAW PANEL DIAGNOSTICS");
    println!("Rows: {}\n", diagnostics.rows);

    section("Factors with missing values");
    for (factor, count) in diagnostics.missing.iter().take(top) {
        println!(
            "  {:<30} {:>10} ({:>5.1}%)",
            factor,
            count,
            percent(*count, diagnostics.rows)
        );
    }
    println!("  ({} factors in total)\n", diagnostics.missing.len());

    section("Factors with zero values");
    for (factor, count) in diagnostics.zeros.iter().take(top) {
        println!(
            "  {:<30} {:>10} ({:>5.1}%)",
            factor,
            count,
            percent(*count, diagnostics.rows)
        );
    }
    println!("  ({} factors in total)\n", diagnostics.zeros.len());

    section("Stocks per months of coverage");
    for bucket in diagnostics.coverage.iter().take(top) {
        println!("  {:>6} months  {:>8} stocks", bucket.months, bucket.entities);
    }
    Ok(())
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

fn header(title: &str) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║{:^62}║", title);
    println!("╚══════════════════════════════════════════════════════════════╝\n");
}

fn section(title: &str) {
    println!("{}", title);
    println!("─────────────────────────────────────────────────────────────");
}

fn print_clean_report(report: &CleanReport) {
    header("CLEANING");
    println!(
        "Factors:   {} of {} retained",
        report.retained_factors, report.candidate_factors
    );
    println!(
        "Stocks:    {} -> {} ({} incomplete, {} short history)",
        report.input_entities,
        report.output_entities,
        report.incomplete_entities,
        report.short_entities
    );
    println!("Rows:      {} -> {}", report.input_rows, report.output_rows);
    println!("Imputed:   {} values", report.imputed_values);
    if report.undefined_medians > 0 || report.constant_series_values > 0 {
        println!(
            "Guards:    {} undefined medians, {} constant-series values",
            report.undefined_medians, report.constant_series_values
        );
    }
}

fn print_selection(outcome: &SelectionOutcome) {
    header("FACTOR SELECTION");
    section("Strategies");
    for run in &outcome.ensemble.runs {
        let secs = run.elapsed.as_secs();
        println!(
            "  {:<24} {:>3} factors  {:02}:{:02}",
            run.name,
            run.features.len(),
            secs / 60,
            secs % 60
        );
    }
    println!();
    section("Held-out MSE");
    for (i, score) in outcome.ensemble.comparison.scores.iter().enumerate() {
        let marker = if i == outcome.ensemble.comparison.best { "*" } else { " " };
        println!("{} {:<24} {:>12.6}", marker, score.name, score.mse);
    }
    println!();
    println!(
        "Ensemble union: {} factors, deep elimination: {} factors",
        outcome.ensemble.union.len(),
        outcome.deep.len()
    );
    println!(
        "Chosen: {} (R² {:.4} vs {:.4})",
        outcome.choice.chosen, outcome.choice.ensemble_r2, outcome.choice.deep_r2
    );
    println!("Selected: {}", outcome.result.factors.names().join(", "));
}

fn print_report(report: &PerformanceReport) {
    header(&format!("PORTFOLIO PERFORMANCE: {}", report.model));
    println!("Best size:          {}", report.best_size);
    match report.sharpe {
        Some(sharpe) => println!("Sharpe ratio:       {:.4}", sharpe),
        None => println!("Sharpe ratio:       undefined"),
    }
    println!("Annualized return:  {:.2}%", report.annualized_return * 100.0);
    println!("Annualized std:     {:.2}%", report.annualized_std * 100.0);
    println!("Months:             {}", report.months);
    if let Some(value) = report.final_cumulative_portfolio {
        println!("Cumulative growth:  {:.4}", value);
    }
    if let Some(value) = report.final_cumulative_benchmark {
        println!("Benchmark growth:   {:.4}", value);
    }

    if !report.top_holdings.is_empty() {
        println!();
        section("Top holdings");
        for holding in &report.top_holdings {
            println!(
                "  {:>8}  {:<32} {:>4} months ({} long, {} short)",
                holding.permno,
                holding.comp_name.as_deref().unwrap_or("-"),
                holding.months_held,
                holding.long_months,
                holding.short_months
            );
        }
    }
}
