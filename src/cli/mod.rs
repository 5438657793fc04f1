//! Command-line parsing for the crypto sentiment pipeline.
//!
//! Parsing lives here; dispatch lives in `app`. Nothing in this module reads
//! files or touches the pipeline.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{Coin, DEFAULT_DATA_DIR, DEFAULT_LANGUAGE, Duration, PipelineConfig, SamplingMode};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "cs", version, about = "Crypto social-post sentiment pipeline")]
pub struct Cli {
    /// More diagnostics on stderr (-v info, -vv debug, -vvv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Clean, score and aggregate one raw post file.
    Run(DatasetArgs),
    /// Run every coin/duration combination found under the data directory.
    RunAll(RunAllArgs),
    /// Re-aggregate a previously written cleaned-post file.
    Aggregate(DatasetArgs),
    /// Build a raw post file from a local archive using the collection plan.
    Collect(CollectArgs),
    /// Print the collection windows for a coin/duration.
    Windows(WindowsArgs),
    /// Join the daily table with external series and write a correlation matrix.
    Correlate(CorrelateArgs),
    /// Render SVG charts for one dataset.
    Plot(PlotArgs),
}

/// Options shared by every per-dataset command.
#[derive(Debug, Args, Clone)]
pub struct DatasetArgs {
    /// Coin to process.
    #[arg(short, long, value_enum, default_value_t = Coin::Bitcoin)]
    pub coin: Coin,

    /// Collection duration of the dataset.
    #[arg(short, long, value_enum, default_value_t = Duration::Snapshot)]
    pub duration: Duration,

    /// Root of the data tree (raw, cleaned, aggregated, plots).
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Raw post CSV to read instead of the default location.
    #[arg(long, value_name = "CSV")]
    pub input: Option<PathBuf>,

    /// Lexicon CSV (`word,polarity,subjectivity`) replacing the built-in one.
    #[arg(long, value_name = "CSV")]
    pub lexicon: Option<PathBuf>,

    /// Language code posts must carry to be kept.
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    pub language: String,
}

impl DatasetArgs {
    pub fn config(&self) -> PipelineConfig {
        PipelineConfig::builder(self.coin, self.duration)
            .data_dir(&self.data_dir)
            .raw_input(self.input.clone())
            .lexicon(self.lexicon.clone())
            .language(self.language.clone())
            .build()
    }
}

#[derive(Debug, Args, Clone)]
pub struct RunAllArgs {
    /// Root of the data tree.
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Lexicon CSV replacing the built-in one.
    #[arg(long, value_name = "CSV")]
    pub lexicon: Option<PathBuf>,

    /// Language code posts must carry to be kept.
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    pub language: String,
}

#[derive(Debug, Args, Clone)]
pub struct CollectArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Raw post CSV to search.
    #[arg(long, value_name = "CSV")]
    pub archive: PathBuf,

    /// How much of each month the extended plan samples.
    #[arg(long, value_enum, default_value_t = SamplingMode::FirstDayOfMonth)]
    pub sampling: SamplingMode,

    /// Where to write the collected posts (defaults to the dataset's raw path).
    #[arg(long, value_name = "CSV")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct WindowsArgs {
    #[arg(short, long, value_enum, default_value_t = Coin::Bitcoin)]
    pub coin: Coin,

    #[arg(short, long, value_enum, default_value_t = Duration::Snapshot)]
    pub duration: Duration,

    #[arg(long, value_enum, default_value_t = SamplingMode::FirstDayOfMonth)]
    pub sampling: SamplingMode,
}

/// External date-keyed series used by `correlate` and `plot`.
#[derive(Debug, Args, Clone, Default)]
pub struct SeriesArgs {
    /// Coin price CSV (`Date,Close,...`).
    #[arg(long, value_name = "CSV")]
    pub price: Option<PathBuf>,

    /// Column of the price CSV to use.
    #[arg(long, default_value = "Close")]
    pub price_column: String,

    /// External tweet volume CSV (`Date,Tweets`).
    #[arg(long, value_name = "CSV")]
    pub volume: Option<PathBuf>,

    /// Column of the volume CSV (first non-date column when omitted).
    #[arg(long)]
    pub volume_column: Option<String>,

    /// Search trend CSV (`Date,Search_Volume`).
    #[arg(long, value_name = "CSV")]
    pub trend: Option<PathBuf>,

    /// Column of the trend CSV (first non-date column when omitted).
    #[arg(long)]
    pub trend_column: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct CorrelateArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    #[command(flatten)]
    pub series: SeriesArgs,
}

#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    #[command(flatten)]
    pub series: SeriesArgs,
}
