//! CLI entry point for the real-estate cleaning pipeline.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use estate_pipeline::{
    CleaningSummary, ExplorationReport, Pipeline, PipelineConfig, PipelineConfigBuilder,
    PreparedFiles, export::write_json, load_dataset,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Real-estate data cleaning and feature-preparation pipeline",
    long_about = "Cleans a property-sales table, explores it, and writes model-ready splits.\n\n\
                  EXAMPLES:\n  \
                  # Full run from a spreadsheet\n  \
                  estate-pipeline run -i data.xlsx\n\n  \
                  # Clean only\n  \
                  estate-pipeline clean -i data.xlsx -o Cleaned_House_Data.csv\n\n  \
                  # Exploration report as JSON\n  \
                  estate-pipeline explore -i Cleaned_House_Data.csv --json\n\n  \
                  # Prepare splits with a different seed\n  \
                  estate-pipeline --seed 7 prepare -i Cleaned_House_Data.csv -d prepared/"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// JSON configuration file; flags below override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Target column to predict
    #[arg(short, long, global = true)]
    target: Option<String>,

    /// Seed for the train/test shuffle
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Share of rows used for training, strictly between 0 and 1
    #[arg(long, global = true)]
    split_ratio: Option<f64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load, clean and export a raw dataset
    Clean {
        /// Raw dataset (.xlsx, .csv, .parquet)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Cleaned CSV destination
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print diagnostics for a cleaned dataset
    Explore {
        /// Cleaned dataset
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Also write the report as JSON to this path
        #[arg(short = 'r', long)]
        emit_report: Option<PathBuf>,

        /// Print JSON to stdout instead of text; disables logging
        #[arg(long)]
        json: bool,
    },
    /// Encode, split and scale a cleaned dataset
    Prepare {
        /// Cleaned dataset
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory for X/y splits and feature_schema.json
        #[arg(short = 'd', long)]
        output_dir: Option<PathBuf>,
    },
    /// Clean, export, explore and prepare in one pass
    Run {
        /// Raw dataset (.xlsx, .csv, .parquet)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Cleaned CSV destination
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for X/y splits and feature_schema.json
        #[arg(short = 'd', long)]
        output_dir: Option<PathBuf>,
    },
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries JSON.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let json_output = matches!(cli.command, Command::Explore { json: true, .. });
    init_logging(&cli.global.log_level, cli.global.quiet, json_output);

    let base = load_base_config(&cli.global)?;

    match cli.command {
        Command::Clean { input, output } => {
            let config = apply_overrides(base, &cli.global)
                .source_path_opt(input)
                .output_path_opt(output)
                .build()?;
            let pipeline = Pipeline::builder().config(config).build()?;

            let raw = pipeline.load(&pipeline.config().source_path)?;
            let mut cleaned = pipeline.clean(raw)?;
            pipeline.export(&mut cleaned.data, &pipeline.config().output_path)?;

            print_cleaning_summary(&cleaned.summary, &pipeline.config().output_path);
        }
        Command::Explore {
            input,
            emit_report,
            json,
        } => {
            let config = apply_overrides(base, &cli.global).build()?;
            let input = input.unwrap_or_else(|| config.output_path.clone());
            let pipeline = Pipeline::builder().config(config).build()?;

            let df = load_dataset(&input)?;
            let report = pipeline.explore(&df)?;

            if json {
                println!("{}", report.to_json()?);
            } else {
                println!("{report}");
            }
            if let Some(path) = emit_report {
                write_json(&report, &path)?;
                info!("Report written to {}", path.display());
            }
        }
        Command::Prepare { input, output_dir } => {
            let config = apply_overrides(base, &cli.global)
                .prepared_dir_opt(output_dir)
                .build()?;
            let input = input.unwrap_or_else(|| config.output_path.clone());
            let pipeline = Pipeline::builder().config(config).build()?;

            let df = load_dataset(&input)?;
            let mut prepared = pipeline.prepare(df)?;
            let files = prepared.write_to_dir(&pipeline.config().prepared_dir)?;

            print_prepared_summary(
                prepared.x_train.height(),
                prepared.x_test.height(),
                &prepared.schema.features,
                &files,
            );
        }
        Command::Run {
            input,
            output,
            output_dir,
        } => {
            let config = apply_overrides(base, &cli.global)
                .source_path_opt(input)
                .output_path_opt(output)
                .prepared_dir_opt(output_dir)
                .build()?;
            let pipeline = Pipeline::builder().config(config).build()?;

            let run = pipeline.run()?;

            print_cleaning_summary(&run.cleaning, &run.cleaned_path);
            print_report(&run.report);
            print_prepared_summary(
                run.schema.train_rows,
                run.schema.test_rows,
                &run.schema.features,
                &run.prepared_files,
            );
        }
    }

    Ok(())
}

fn load_base_config(global: &GlobalArgs) -> Result<PipelineConfig> {
    match &global.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn apply_overrides(base: PipelineConfig, global: &GlobalArgs) -> PipelineConfigBuilder {
    let mut builder = PipelineConfigBuilder::from_config(base);
    if let Some(target) = &global.target {
        builder = builder.target_column(target);
    }
    if let Some(seed) = global.seed {
        builder = builder.random_seed(seed);
    }
    if let Some(ratio) = global.split_ratio {
        builder = builder.split_ratio(ratio);
    }
    builder
}

/// Optional path overrides for subcommand flags.
trait PathOverrides {
    fn source_path_opt(self, path: Option<PathBuf>) -> Self;
    fn output_path_opt(self, path: Option<PathBuf>) -> Self;
    fn prepared_dir_opt(self, path: Option<PathBuf>) -> Self;
}

impl PathOverrides for PipelineConfigBuilder {
    fn source_path_opt(self, path: Option<PathBuf>) -> Self {
        match path {
            Some(p) => self.source_path(p),
            None => self,
        }
    }

    fn output_path_opt(self, path: Option<PathBuf>) -> Self {
        match path {
            Some(p) => self.output_path(p),
            None => self,
        }
    }

    fn prepared_dir_opt(self, path: Option<PathBuf>) -> Self {
        match path {
            Some(p) => self.prepared_dir(p),
            None => self,
        }
    }
}

/// Human-readable cleaning summary.
///
/// Uses `println!` on purpose: this is the command's output, not logging.
fn print_cleaning_summary(summary: &CleaningSummary, output: &Path) {
    println!("\n{}", "=".repeat(60));
    println!("CLEANING SUMMARY");
    println!("{}", "=".repeat(60));
    println!(
        "Shape: {} -> {} rows, {} -> {} columns ({}ms)",
        summary.rows_before,
        summary.rows_after,
        summary.columns_before,
        summary.columns_after,
        summary.duration_ms
    );
    println!("Duplicates removed: {}", summary.duplicates_removed);
    for record in &summary.imputations {
        println!(
            "Imputed '{}' ({}): {} value(s) with {}{}",
            record.column,
            record.kind.as_str(),
            record.filled,
            record.strategy.display_name(),
            record
                .fill_value
                .as_deref()
                .map(|v| format!(" = '{v}'"))
                .unwrap_or_default()
        );
    }
    if let Some(col) = &summary.date_column {
        println!(
            "Sale dates: '{}' ({} invalid row(s) dropped)",
            col, summary.invalid_dates_dropped
        );
    }
    for dropped in &summary.dropped_columns {
        println!("Dropped '{}': {}", dropped.name, dropped.reason.display_name());
    }
    println!(
        "Duplicates removed after pruning: {}",
        summary.post_pruning_duplicates_removed
    );
    for warning in &summary.warnings {
        println!("Warning: {warning}");
    }
    println!("\nCleaned data saved to: {}", output.display());
}

fn print_report(report: &ExplorationReport) {
    println!("{report}");
}

fn print_prepared_summary(train: usize, test: usize, features: &[String], files: &PreparedFiles) {
    println!("\n{}", "=".repeat(60));
    println!("PREPARATION COMPLETE");
    println!("{}", "=".repeat(60));
    println!("Training set: {train} samples");
    println!("Test set:     {test} samples");
    println!("Features ({}): {:?}", features.len(), features);
    println!("Schema: {}", files.schema.display());
}
