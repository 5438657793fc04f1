//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - builds a `PipelineConfig` per dataset
//! - runs the pipeline steps in `pipeline`
//! - prints reports to stdout

use clap::Parser;
use tracing::info;

use crate::cli::{CollectArgs, Command, CorrelateArgs, DatasetArgs, PlotArgs, RunAllArgs, SeriesArgs, WindowsArgs};
use crate::collect::collection_plan;
use crate::domain::{Coin, Duration, PipelineConfig};
use crate::error::AppError;
use crate::io::ingest::read_series;

pub mod pipeline;

use pipeline::{BatchStatus, ExternalSeries};

/// Entry point for the `cs` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    crate::logging::init(cli.verbose);

    match cli.command {
        Command::Run(args) => handle_run(&args),
        Command::RunAll(args) => handle_run_all(&args),
        Command::Aggregate(args) => handle_aggregate(&args),
        Command::Collect(args) => handle_collect(&args),
        Command::Windows(args) => handle_windows(&args),
        Command::Correlate(args) => handle_correlate(&args),
        Command::Plot(args) => handle_plot(&args),
    }
}

fn handle_run(args: &DatasetArgs) -> Result<(), AppError> {
    let config = args.config();
    let run = pipeline::run_pipeline(&config)?;
    println!("{}", crate::report::format_run_summary(&config, &run));
    Ok(())
}

fn handle_aggregate(args: &DatasetArgs) -> Result<(), AppError> {
    let config = args.config();
    let run = pipeline::run_aggregate(&config)?;
    println!("{}", crate::report::format_run_summary(&config, &run));
    Ok(())
}

fn handle_run_all(args: &RunAllArgs) -> Result<(), AppError> {
    let template = PipelineConfig::builder(Coin::Bitcoin, Duration::Snapshot)
        .data_dir(&args.data_dir)
        .lexicon(args.lexicon.clone())
        .language(args.language.clone())
        .build();

    let outcomes = pipeline::run_all(&template);
    println!("{}", crate::report::format_batch(&template, &outcomes));

    let failed = outcomes
        .iter()
        .filter(|o| matches!(o.status, BatchStatus::Failed(_)))
        .count();
    if failed > 0 {
        return Err(AppError::input(format!("{failed} of {} runs failed.", outcomes.len())));
    }
    Ok(())
}

fn handle_collect(args: &CollectArgs) -> Result<(), AppError> {
    let config = args.dataset.config();
    let out = pipeline::run_collect(&config, &args.archive, args.sampling, args.out.clone())?;
    println!(
        "Collected {} posts over {} window(s) -> {}",
        out.posts,
        out.plan.len(),
        out.path.display()
    );
    Ok(())
}

fn handle_windows(args: &WindowsArgs) -> Result<(), AppError> {
    let plan = collection_plan(args.coin, args.duration, args.sampling);
    println!("{}", crate::report::format_windows(args.coin, args.duration, &plan));
    Ok(())
}

fn handle_correlate(args: &CorrelateArgs) -> Result<(), AppError> {
    let config = args.dataset.config();
    let external = load_external(&args.series)?;
    let out = pipeline::run_correlation(&config, &external)?;

    println!("{}", crate::report::format_correlation(&out.matrix, out.days));
    println!("Wrote {}", out.path.display());
    Ok(())
}

fn handle_plot(args: &PlotArgs) -> Result<(), AppError> {
    let config = args.dataset.config();
    let external = load_external(&args.series)?;
    let charts = pipeline::run_plots(&config, &external)?;

    for path in &charts {
        println!("{}", path.display());
    }
    Ok(())
}

/// Read whichever external series were given on the command line.
pub fn load_external(args: &SeriesArgs) -> Result<ExternalSeries, AppError> {
    let price = args
        .price
        .as_deref()
        .map(|p| read_series(p, Some(args.price_column.as_str()), "price"))
        .transpose()?;
    let volume = args
        .volume
        .as_deref()
        .map(|p| read_series(p, args.volume_column.as_deref(), "tweet_volume"))
        .transpose()?;
    let trend = args
        .trend
        .as_deref()
        .map(|p| read_series(p, args.trend_column.as_deref(), "search_trend"))
        .transpose()?;

    for series in [&price, &volume, &trend].into_iter().flatten() {
        info!(series = %series.name, points = series.len(), "loaded external series");
    }

    Ok(ExternalSeries { price, volume, trend })
}
