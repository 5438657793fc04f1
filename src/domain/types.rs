//! Shared domain types.
//!
//! These types are intentionally kept small and owned so each stage can hand
//! its output to the next by value:
//!
//! - `Post` (collector output) -> `CleanedPost` (normalizer output)
//! - `CleanedPost` -> `DailyAggregate` (aggregator output)

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Default root for all generated tables and charts.
pub const DEFAULT_DATA_DIR: &str = "output_data";

/// Posts in any other language are dropped by the normalizer.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Tracked cryptocurrency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Coin {
    Bitcoin,
    Cardano,
}

impl Coin {
    pub const ALL: [Coin; 2] = [Coin::Bitcoin, Coin::Cardano];

    /// Lowercase name used in file names.
    pub fn slug(self) -> &'static str {
        match self {
            Coin::Bitcoin => "bitcoin",
            Coin::Cardano => "cardano",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Coin::Bitcoin => "Bitcoin",
            Coin::Cardano => "Cardano",
        }
    }

    /// Search query handed to the collector.
    pub fn tag(self) -> &'static str {
        match self {
            Coin::Bitcoin => "#Bitcoin",
            Coin::Cardano => "#Cardano",
        }
    }

    /// Hashtag spellings that the cleaner expands back into plain words.
    pub fn tag_words(self) -> [&'static str; 2] {
        [self.display_name(), self.slug()]
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.slug())
    }
}

/// Which historical window a dataset covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Duration {
    /// Short recent window (March 2021).
    Snapshot,
    /// Multi-year window (2018-2021), sampled month by month.
    Extended,
}

impl Duration {
    pub const ALL: [Duration; 2] = [Duration::Snapshot, Duration::Extended];

    pub fn slug(self) -> &'static str {
        match self {
            Duration::Snapshot => "snapshot",
            Duration::Extended => "extended",
        }
    }

    /// Human label used in chart titles.
    pub fn period_label(self) -> &'static str {
        match self {
            Duration::Snapshot => "Mar 2021",
            Duration::Extended => "2018-2021",
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.slug())
    }
}

/// Sign-based sentiment bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// `p < 0` is negative, `p > 0` is positive, anything else (exact zero) is neutral.
    pub fn from_polarity(polarity: f64) -> Self {
        if polarity < 0.0 {
            Sentiment::Negative
        } else if polarity > 0.0 {
            Sentiment::Positive
        } else {
            Sentiment::Neutral
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            other => Err(format!("Unknown sentiment label '{other}'.")),
        }
    }
}

/// Raw post as produced by a collector.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: Option<String>,
    pub timestamp: NaiveDateTime,
    pub text: String,
    /// ISO language code; `None` when the provider left it blank.
    pub language: Option<String>,
}

impl Post {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Post after cleaning and scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedPost {
    pub date: NaiveDate,
    pub clean_text: String,
    pub subjectivity: f64,
    pub polarity: f64,
    pub sentiment: Sentiment,
}

/// One row of the daily sentiment series.
///
/// All ratios derive from the integer counts, so
/// `positive_percentage + negative_percentage + neutral_fraction == 1`.
///
/// Serde names match the daily CSV columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    #[serde(rename = "tweets")]
    pub tweet_count: usize,
    #[serde(rename = "positive_sentiment")]
    pub positive_count: usize,
    #[serde(rename = "negative_sentiment")]
    pub negative_count: usize,
    #[serde(rename = "neutral_sentiment")]
    pub neutral_count: usize,
    pub average_polarity: f64,
    pub average_subjectivity: f64,
    pub positive_percentage: f64,
    pub negative_percentage: f64,
    #[serde(rename = "objective")]
    pub objective_fraction: f64,
    #[serde(rename = "neutral")]
    pub neutral_fraction: f64,
}

/// Half-open date range `[since, until)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

impl DateWindow {
    pub fn new(since: NaiveDate, until: NaiveDate) -> Option<Self> {
        (since < until).then_some(Self { since, until })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.since <= date && date < self.until
    }

    pub fn days(&self) -> i64 {
        (self.until - self.since).num_days()
    }

    /// `YYYY-MM` of the window start, used in log lines.
    pub fn month_label(&self) -> String {
        format!("{:04}-{:02}", self.since.year(), self.since.month())
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.since, self.until)
    }
}

/// How each month of the extended range is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SamplingMode {
    /// One day per month: `[YYYY-MM-01, YYYY-MM-02)`.
    #[default]
    FirstDayOfMonth,
    /// The whole calendar month.
    WholeMonth,
}

/// Inputs and output locations for one (coin, duration) run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub coin: Coin,
    pub duration: Duration,
    pub data_dir: PathBuf,
    /// Overrides the default raw-post location under `data_dir`.
    pub raw_input: Option<PathBuf>,
    /// CSV lexicon (`word,polarity,subjectivity`) replacing the built-in one.
    pub lexicon: Option<PathBuf>,
    pub language: String,
}

impl PipelineConfig {
    pub fn builder(coin: Coin, duration: Duration) -> PipelineConfigBuilder {
        PipelineConfigBuilder::new(coin, duration)
    }

    pub fn raw_path(&self) -> PathBuf {
        self.raw_input.clone().unwrap_or_else(|| {
            self.data_dir.join("raw_tweet_data").join(format!(
                "{}_tweets_results_{}.csv",
                self.coin, self.duration
            ))
        })
    }

    pub fn cleaned_path(&self) -> PathBuf {
        self.data_dir.join("clean_tweet_data").join(format!(
            "{}_cleaned_tweets_{}.csv",
            self.coin, self.duration
        ))
    }

    pub fn daily_path(&self) -> PathBuf {
        self.data_dir.join("sentiment_dataframes_csv").join(format!(
            "{}_sentiment_dataframe_{}.csv",
            self.coin, self.duration
        ))
    }

    pub fn correlation_path(&self) -> PathBuf {
        self.data_dir.join("correlation_data").join(format!(
            "{}_correlation_{}.csv",
            self.coin, self.duration
        ))
    }

    pub fn plots_dir(&self) -> PathBuf {
        self.data_dir.join("plots")
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    fn new(coin: Coin, duration: Duration) -> Self {
        Self {
            config: PipelineConfig {
                coin,
                duration,
                data_dir: PathBuf::from(DEFAULT_DATA_DIR),
                raw_input: None,
                lexicon: None,
                language: DEFAULT_LANGUAGE.to_string(),
            },
        }
    }

    pub fn data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.data_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn raw_input(mut self, path: Option<PathBuf>) -> Self {
        self.config.raw_input = path;
        self
    }

    pub fn lexicon(mut self, path: Option<PathBuf>) -> Self {
        self.config.lexicon = path;
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    pub fn build(self) -> PipelineConfig {
        self.config
    }
}
