//! Shared pipeline steps used by every CLI command.
//!
//! Each step reads its inputs from the data tree described by a
//! `PipelineConfig`, does the work in memory, and writes its outputs back:
//!
//! raw posts -> filter/clean/score -> cleaned table -> daily table
//! -> (joins with external series) -> correlation matrix / charts
//!
//! Printing is left to `app`.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::analysis::{
    CorrelationMatrix, DatedSeries, SentimentTotals, aggregate_daily, correlation_matrix, daily_series, join_series,
    normalize_posts,
};
use crate::collect::{ArchivePostSource, PostQuery, collect_posts, collection_plan};
use crate::domain::{CleanedPost, Coin, DailyAggregate, Duration, PipelineConfig, Post, SamplingMode};
use crate::error::AppError;
use crate::io::export::{remove_stale, write_cleaned_csv, write_correlation_csv, write_daily_csv, write_raw_posts};
use crate::io::ingest::{read_cleaned_posts, read_daily_aggregates, read_lexicon, read_raw_posts};
use crate::plot::{self, ChartKind};
use crate::sentiment::{Lexicon, LexiconScorer, SentimentModel};

/// Everything one clean-score-aggregate run produced.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub rows_read: usize,
    pub cleaned: Vec<CleanedPost>,
    pub daily: Vec<DailyAggregate>,
    pub totals: SentimentTotals,
}

/// Scorer for a run: the configured lexicon file, or the built-in lexicon.
pub fn load_model(config: &PipelineConfig) -> Result<LexiconScorer, AppError> {
    let lexicon = match &config.lexicon {
        Some(path) => read_lexicon(path)?,
        None => Lexicon::builtin(),
    };
    info!(words = lexicon.len(), "loaded lexicon");
    Ok(LexiconScorer::new(lexicon))
}

/// Raw file -> cleaned table -> daily table, both written under the data tree.
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunOutput, AppError> {
    let raw_path = config.raw_path();
    let posts = read_raw_posts(&raw_path)?;
    info!(path = %raw_path.display(), rows = posts.len(), "read raw posts");

    let model = load_model(config)?;
    run_pipeline_with_posts(config, posts, &model)
}

/// Same as `run_pipeline` for posts already in memory.
pub fn run_pipeline_with_posts<M>(
    config: &PipelineConfig,
    posts: Vec<Post>,
    model: &M,
) -> Result<RunOutput, AppError>
where
    M: SentimentModel + ?Sized,
{
    let rows_read = posts.len();
    let cleaned = normalize_posts(posts, config.coin, &config.language, model);
    info!(kept = cleaned.len(), language = %config.language, "normalized posts");
    write_cleaned_csv(&config.cleaned_path(), &cleaned)?;

    let daily = aggregate_or_clear(config, &cleaned)?;
    write_daily_csv(&config.daily_path(), &daily)?;

    let totals = SentimentTotals::from_daily(&daily);
    Ok(RunOutput {
        rows_read,
        cleaned,
        daily,
        totals,
    })
}

/// Aggregate, or on an empty batch remove the previous daily table so it
/// cannot be paired with the freshly written (empty) cleaned table.
fn aggregate_or_clear(config: &PipelineConfig, cleaned: &[CleanedPost]) -> Result<Vec<DailyAggregate>, AppError> {
    match aggregate_daily(cleaned) {
        Ok(daily) => Ok(daily),
        Err(err) => {
            if err.is_invalid_input() {
                remove_stale(&config.daily_path())?;
            }
            Err(err)
        }
    }
}

/// Re-aggregate a cleaned table written by an earlier run.
pub fn run_aggregate(config: &PipelineConfig) -> Result<RunOutput, AppError> {
    let cleaned = read_cleaned_posts(&config.cleaned_path())?;
    let daily = aggregate_or_clear(config, &cleaned)?;
    write_daily_csv(&config.daily_path(), &daily)?;

    let totals = SentimentTotals::from_daily(&daily);
    Ok(RunOutput {
        rows_read: cleaned.len(),
        cleaned,
        daily,
        totals,
    })
}

/// How one combination of a batch ended.
#[derive(Debug)]
pub enum BatchStatus {
    Done(RunOutput),
    /// Nothing left after filtering; not an error for the batch as a whole.
    Skipped(AppError),
    Failed(AppError),
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub coin: Coin,
    pub duration: Duration,
    pub status: BatchStatus,
}

/// Run every coin x duration combination, each independently.
pub fn run_all(template: &PipelineConfig) -> Vec<BatchOutcome> {
    let mut outcomes = Vec::new();

    for coin in Coin::ALL {
        for duration in Duration::ALL {
            let config = PipelineConfig {
                coin,
                duration,
                raw_input: None,
                ..template.clone()
            };

            let status = match run_pipeline(&config) {
                Ok(run) => BatchStatus::Done(run),
                Err(err) if err.is_invalid_input() => {
                    warn!(%coin, %duration, "skipping empty batch: {err}");
                    BatchStatus::Skipped(err)
                }
                Err(err) => {
                    warn!(%coin, %duration, "batch failed: {err}");
                    BatchStatus::Failed(err)
                }
            };
            outcomes.push(BatchOutcome { coin, duration, status });
        }
    }

    outcomes
}

/// Result of running a collection plan against an archive.
#[derive(Debug, Clone)]
pub struct CollectOutput {
    pub plan: Vec<PostQuery>,
    pub posts: usize,
    pub path: PathBuf,
}

pub fn run_collect(
    config: &PipelineConfig,
    archive: &std::path::Path,
    sampling: SamplingMode,
    out: Option<PathBuf>,
) -> Result<CollectOutput, AppError> {
    let mut source = ArchivePostSource::from_csv(archive)?;
    info!(path = %archive.display(), posts = source.len(), "opened archive");

    let plan = collection_plan(config.coin, config.duration, sampling);
    let posts = collect_posts(&mut source, &plan)?;

    let path = out.unwrap_or_else(|| config.raw_path());
    write_raw_posts(&path, &posts)?;

    Ok(CollectOutput {
        plan,
        posts: posts.len(),
        path,
    })
}

/// Optional date-keyed series from outside the pipeline.
#[derive(Debug, Clone, Default)]
pub struct ExternalSeries {
    pub price: Option<DatedSeries>,
    pub volume: Option<DatedSeries>,
    pub trend: Option<DatedSeries>,
}

impl ExternalSeries {
    fn iter(&self) -> impl Iterator<Item = &DatedSeries> {
        [&self.price, &self.volume, &self.trend].into_iter().flatten()
    }
}

#[derive(Debug, Clone)]
pub struct CorrelationOutput {
    pub matrix: CorrelationMatrix,
    pub days: usize,
    pub path: PathBuf,
}

fn correlate(daily: &[DailyAggregate], external: &ExternalSeries) -> Result<(CorrelationMatrix, usize), AppError> {
    let mut series = daily_series(daily);
    series.extend(external.iter().cloned());

    let frame = join_series(&series)?;
    let matrix = correlation_matrix(&frame)?;
    Ok((matrix, frame.dates.len()))
}

/// Join the daily table with the external series and write the correlation matrix.
pub fn run_correlation(config: &PipelineConfig, external: &ExternalSeries) -> Result<CorrelationOutput, AppError> {
    let daily = read_daily_aggregates(&config.daily_path())?;
    let (matrix, days) = correlate(&daily, external)?;

    let path = config.correlation_path();
    write_correlation_csv(&path, &matrix)?;
    Ok(CorrelationOutput { matrix, days, path })
}

/// Draw every chart the available data allows. Returns the written files.
///
/// Charts whose inputs do not overlap (empty join, too few days) are skipped
/// with a warning; read and write failures still abort.
pub fn run_plots(config: &PipelineConfig, external: &ExternalSeries) -> Result<Vec<PathBuf>, AppError> {
    let cleaned = read_cleaned_posts(&config.cleaned_path())?;
    let daily = read_daily_aggregates(&config.daily_path())?;

    let coin = config.coin.display_name();
    let period = config.duration.period_label();
    let dir = config.plots_dir();
    let path = |kind: ChartKind| kind.path(&dir, config.coin, config.duration);

    let mut written = Vec::new();
    let mut keep = |kind: ChartKind, result: Result<(), AppError>| -> Result<(), AppError> {
        match result {
            Ok(()) => {
                written.push(path(kind));
                Ok(())
            }
            Err(err) if err.is_invalid_input() => {
                warn!(chart = ?kind, "skipping chart: {err}");
                Ok(())
            }
            Err(err) => Err(err),
        }
    };

    let daily_cols = daily_series(&daily);
    let tweets = &daily_cols[0];
    let polarity = &daily_cols[1];

    keep(
        ChartKind::Polarity,
        plot::polarity_histogram(
            &path(ChartKind::Polarity),
            &cleaned,
            &format!("{coin} Polarity Distribution {period}"),
        ),
    )?;
    keep(
        ChartKind::Objectivity,
        plot::sentiment_breakdown(
            &path(ChartKind::Objectivity),
            &daily,
            &format!("{coin} Sentiment Breakdown {period}"),
        ),
    )?;

    let volume = external.volume.as_ref().unwrap_or(tweets);
    keep(
        ChartKind::TweetVolume,
        plot::line_chart(
            &path(ChartKind::TweetVolume),
            volume,
            &format!("{coin} Tweet Volume {period}"),
            "Tweets",
        ),
    )?;

    if let Some(price) = &external.price {
        keep(
            ChartKind::CoinPrice,
            plot::line_chart(
                &path(ChartKind::CoinPrice),
                price,
                &format!("{coin} Price {period}"),
                "Close (USD)",
            ),
        )?;
        keep(
            ChartKind::SentimentPrice,
            plot::dual_axis_chart(
                &path(ChartKind::SentimentPrice),
                polarity,
                price,
                &format!("{coin} Price vs Average Polarity {period}"),
                "Average Polarity",
                "Close (USD)",
            ),
        )?;
        keep(
            ChartKind::TweetVolumePrice,
            plot::dual_axis_chart(
                &path(ChartKind::TweetVolumePrice),
                volume,
                price,
                &format!("{coin} Price vs Tweet Volume {period}"),
                "Tweets",
                "Close (USD)",
            ),
        )?;
        if let Some(trend) = &external.trend {
            keep(
                ChartKind::TrendPrice,
                plot::dual_axis_chart(
                    &path(ChartKind::TrendPrice),
                    trend,
                    price,
                    &format!("{coin} Price vs Search Trend {period}"),
                    "Search Volume",
                    "Close (USD)",
                ),
            )?;
        }
    }

    let heatmap = correlate(&daily, external).and_then(|(matrix, _)| {
        plot::correlation_heatmap(
            &path(ChartKind::Correlation),
            &matrix,
            &format!("{coin} Correlation {period}"),
        )
    });
    keep(ChartKind::Correlation, heatmap)?;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::Path;

    use crate::domain::Sentiment;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cs-pipeline-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn write(path: &Path, body: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    const RAW: &str = "id,date,time,tweet,language\n\
        1,2021-03-14,10:00:00,#Bitcoin is good,en\n\
        2,2021-03-14,11:00:00,\"bad news for #bitcoin @bob\",en\n\
        3,2021-03-14,12:00:00,hola #Bitcoin,es\n\
        4,2021-03-15,09:00:00,#Bitcoin at https://x.co/a,en\n";

    #[test]
    fn pipeline_writes_cleaned_and_daily_tables() {
        let dir = temp_dir("run");
        let config = PipelineConfig::builder(Coin::Bitcoin, Duration::Snapshot).data_dir(&dir).build();
        write(&config.raw_path(), RAW);

        let run = run_pipeline(&config).unwrap();
        assert_eq!(run.rows_read, 4);
        assert_eq!(run.cleaned.len(), 3);
        assert_eq!(run.daily.len(), 2);
        assert_eq!(run.totals.tweets, 3);
        assert_eq!(run.cleaned[0].clean_text, "Bitcoin is good");
        assert_eq!(run.cleaned[0].sentiment, Sentiment::Positive);
        assert_eq!(run.cleaned[1].sentiment, Sentiment::Negative);
        assert_eq!(run.cleaned[2].clean_text, "Bitcoin at");

        assert!(config.cleaned_path().exists());
        let reloaded = run_aggregate(&config).unwrap();
        assert_eq!(reloaded.daily, run.daily);
    }

    #[test]
    fn empty_batch_is_invalid_and_run_all_continues() {
        let dir = temp_dir("all");
        let template = PipelineConfig::builder(Coin::Bitcoin, Duration::Snapshot).data_dir(&dir).build();

        write(&template.raw_path(), RAW);
        let cardano = PipelineConfig {
            coin: Coin::Cardano,
            ..template.clone()
        };
        write(&cardano.raw_path(), "id,date,time,tweet,language\n1,2021-03-14,10:00:00,hola,es\n");

        let err = run_pipeline(&cardano).unwrap_err();
        assert!(err.is_invalid_input());

        let outcomes = run_all(&template);
        assert_eq!(outcomes.len(), 4);
        let status = |coin, duration| {
            &outcomes
                .iter()
                .find(|o| o.coin == coin && o.duration == duration)
                .unwrap()
                .status
        };
        assert!(matches!(status(Coin::Bitcoin, Duration::Snapshot), BatchStatus::Done(_)));
        assert!(matches!(status(Coin::Cardano, Duration::Snapshot), BatchStatus::Skipped(_)));
        assert!(matches!(status(Coin::Bitcoin, Duration::Extended), BatchStatus::Failed(_)));
    }

    #[test]
    fn empty_rerun_removes_previous_daily_table() {
        let dir = temp_dir("rerun");
        let config = PipelineConfig::builder(Coin::Bitcoin, Duration::Snapshot).data_dir(&dir).build();

        write(&config.raw_path(), "id,date,time,tweet,language\n1,2021-03-14,10:00:00,#Bitcoin good,en\n");
        run_pipeline(&config).unwrap();
        assert!(config.daily_path().exists());

        write(&config.raw_path(), "id,date,time,tweet,language\n1,2021-03-15,10:00:00,#Bitcoin bueno,es\n");
        let err = run_pipeline(&config).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(read_cleaned_posts(&config.cleaned_path()).unwrap().is_empty());
        assert!(!config.daily_path().exists());

        // Reloading the empty cleaned table behaves the same way.
        assert!(run_aggregate(&config).unwrap_err().is_invalid_input());
        assert!(!config.daily_path().exists());
    }

    #[test]
    fn collect_then_run_uses_the_plan() {
        let dir = temp_dir("collect");
        let archive = dir.join("archive.csv");
        write(
            &archive,
            "id,date,time,tweet,language\n\
             1,2021-03-13,10:00:00,#Bitcoin too early,en\n\
             2,2021-03-20,10:00:00,#Bitcoin good,en\n\
             3,2021-03-20,10:00:00,#Cardano good,en\n",
        );
        let config = PipelineConfig::builder(Coin::Bitcoin, Duration::Snapshot).data_dir(&dir).build();

        let collected = run_collect(&config, &archive, SamplingMode::default(), None).unwrap();
        assert_eq!(collected.plan.len(), 1);
        assert_eq!(collected.posts, 1);
        assert_eq!(collected.path, config.raw_path());

        let run = run_pipeline(&config).unwrap();
        assert_eq!(run.daily.len(), 1);
        assert_eq!(run.daily[0].date, NaiveDate::from_ymd_opt(2021, 3, 20).unwrap());
    }

    #[test]
    fn correlation_and_plots_from_written_tables() {
        let dir = temp_dir("corr");
        let config = PipelineConfig::builder(Coin::Bitcoin, Duration::Snapshot).data_dir(&dir).build();
        write(&config.raw_path(), RAW);
        run_pipeline(&config).unwrap();

        let d = |day| NaiveDate::from_ymd_opt(2021, 3, day).unwrap();
        let external = ExternalSeries {
            price: Some(DatedSeries::new("price", [(d(14), 60000.0), (d(15), 58000.0), (d(16), 1.0)])),
            ..ExternalSeries::default()
        };

        let out = run_correlation(&config, &external).unwrap();
        assert_eq!(out.days, 2);
        assert_eq!(out.matrix.labels.len(), 6);
        assert_eq!(out.matrix.get("price", "price"), Some(1.0));
        assert!(out.path.exists());

        let charts = run_plots(&config, &external).unwrap();
        assert!(charts.contains(&ChartKind::Polarity.path(&config.plots_dir(), Coin::Bitcoin, Duration::Snapshot)));
        assert!(charts.iter().all(|p| p.exists()));
        // no trend series given
        assert!(!charts.iter().any(|p| p.to_string_lossy().contains("google_trend")));
    }
}
