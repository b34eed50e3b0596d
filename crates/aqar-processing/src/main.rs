//! CLI entry point for the listing preprocessing pipeline.

use anyhow::{Result, anyhow};
use aqar_processing::{
    EnrichConfig, Pipeline, PipelineConfig, PreprocessOutput, PreprocessingError,
    PreprocessingSummary,
};
use clap::Parser;
use dotenv::dotenv;
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Cleaning and NLP enrichment for scraped real-estate listings",
    long_about = "Cleans a scraped listings CSV into a fixed-schema table and optionally \
                  appends sentence-embedding and TF-IDF features.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  RUST_LOG               Overrides --log-level\n  \
                  FASTEMBED_CACHE_DIR    Cache directory for the embedding model\n\n\
                  EXAMPLES:\n  \
                  # Clean and print a summary\n  \
                  aqar-processing -i listings.csv\n\n  \
                  # Clean, enrich and write the table\n  \
                  aqar-processing -i listings.csv --enrich -o enriched.csv\n\n  \
                  # Machine-readable summary\n  \
                  aqar-processing -i listings.csv --json | jq .summary.imputations"
)]
struct Args {
    /// Path to the listings CSV file
    #[arg(short, long)]
    input: PathBuf,

    /// Write the resulting table to this CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Append embedding and TF-IDF features for Location and Title
    ///
    /// Requires the `fastembed` feature.
    #[arg(long)]
    enrich: bool,

    /// JSON file with pipeline settings (missing fields take defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Vocabulary cap for each TF-IDF block
    #[arg(long, default_value = "30")]
    tfidf_max_features: usize,

    /// Standardize Price, Price/m² and Area after imputation
    #[arg(long)]
    scale: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logs; only the final JSON is written.
    #[arg(long)]
    json: bool,
}

/// JSON document printed with `--json`.
#[derive(Serialize)]
struct JsonReport<'a> {
    input: String,
    has_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    load_error: Option<String>,
    enriched: bool,
    rows: usize,
    columns: Vec<String>,
    summary: &'a PreprocessingSummary,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
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
    // .env may set RUST_LOG, so load it before the subscriber reads the env
    dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if args.scale {
        config.scale_numeric = true;
    }

    let enrich_config = EnrichConfig::builder()
        .tfidf_max_features(args.tfidf_max_features)
        .build()?;

    let mut builder = Pipeline::builder().config(config);
    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }
    let pipeline = builder.build()?;

    let mut output = match pipeline.preprocess(&args.input) {
        Ok(output) => output,
        Err(e) => return Err(report_failure(e)),
    };

    let mut enriched = false;
    if args.enrich && output.has_data() {
        match enrich(&output.data, enrich_config, args.quiet || args.json) {
            Ok(Some(df)) => {
                output.data = df;
                enriched = true;
            }
            Ok(None) => {}
            Err(e) => return Err(report_failure(e)),
        }
    }

    if let Some(path) = &args.output {
        if output.has_data() {
            write_csv(&mut output.data, path)?;
            info!("Wrote {}", path.display());
        } else {
            warn!("Nothing written to {}: no data available", path.display());
        }
    }

    if args.json {
        print_json(&args, &output, enriched)?;
    } else {
        print_human_readable_summary(&args, &output, enriched);
    }

    Ok(())
}

/// Log a fatal pipeline error and turn it into the process error.
fn report_failure(e: PreprocessingError) -> anyhow::Error {
    error!("[{}] {}", e.error_code(), e);
    anyhow!("Data available but could not be processed: {}", e)
}

#[cfg(feature = "fastembed")]
fn enrich(
    df: &DataFrame,
    config: EnrichConfig,
    quiet: bool,
) -> aqar_processing::PreprocessingResult<Option<DataFrame>> {
    use aqar_processing::features::{FastEmbedder, FeatureEnricher};
    use std::sync::Arc;

    let embedder = Arc::new(FastEmbedder::from_env()?);
    let mut builder = FeatureEnricher::builder(embedder).config(config);
    if !quiet {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.stage_progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }
    Ok(Some(builder.build()?.enrich(df)?))
}

#[cfg(not(feature = "fastembed"))]
fn enrich(
    _df: &DataFrame,
    _config: EnrichConfig,
    _quiet: bool,
) -> aqar_processing::PreprocessingResult<Option<DataFrame>> {
    warn!("Embedding support not compiled in. Skipping enrichment.");
    warn!("Compile with --features fastembed to enable it.");
    Ok(None)
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

fn print_json(args: &Args, output: &PreprocessOutput, enriched: bool) -> Result<()> {
    let report = JsonReport {
        input: args.input.display().to_string(),
        has_data: output.has_data(),
        load_error: output.load_error.as_ref().map(|e| e.to_string()),
        enriched,
        rows: output.data.height(),
        columns: aqar_processing::utils::column_names(&output.data),
        summary: &output.summary,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Print a human-readable summary of the run.
///
/// Uses `println!` on purpose: this is the command's result, not a log.
fn print_human_readable_summary(args: &Args, output: &PreprocessOutput, enriched: bool) {
    let summary = &output.summary;

    println!();
    println!("{}", "=".repeat(80));

    if let Some(load_error) = &output.load_error {
        println!("NO DATA AVAILABLE");
        println!("{}", "=".repeat(80));
        println!("  {}", load_error);
        println!("{}", "=".repeat(80));
        return;
    }

    println!("PREPROCESSING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        args.input.display(),
        summary.rows_before,
        summary.columns_before
    );
    match &args.output {
        Some(path) if output.has_data() => println!(
            "Output: {} ({} rows x {} columns)",
            path.display(),
            output.data.height(),
            output.data.width()
        ),
        _ => println!(
            "Result: {} rows x {} columns",
            output.data.height(),
            output.data.width()
        ),
    }
    if enriched {
        println!(
            "Feature columns added: {}",
            output.data.width() - summary.columns_after
        );
    }
    println!();

    if !output.has_data() {
        println!("The input has no rows.");
        println!("{}", "=".repeat(80));
        return;
    }

    println!("Processing Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!("  Missing markers replaced: {}", summary.missing_markers_replaced);
    println!("  Cells imputed: {}", summary.cells_imputed());
    if !summary.dropped_columns.is_empty() {
        println!("  Dropped columns: {}", summary.dropped_columns.join(", "));
    }
    println!();

    if !summary.imputations.is_empty() {
        println!("Imputation:");
        for record in &summary.imputations {
            println!(
                "  - {}: {} cells with {} ({})",
                record.column, record.filled, record.strategy, record.fill_value
            );
        }
        println!();
    }

    if !summary.warnings.is_empty() {
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}
