//! Chart rendering (SVG files via Plotters).
//!
//! Charts are pure consumers of the tables produced by the pipeline: they
//! never change data, only draw it. `ChartKind` fixes where each chart lands
//! so repeated runs overwrite the same files.

use std::path::{Path, PathBuf};

use crate::domain::{Coin, Duration};

pub mod charts;

pub use charts::*;

/// Every chart the `plot` command can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    CoinPrice,
    Polarity,
    Objectivity,
    SentimentPrice,
    TweetVolume,
    TweetVolumePrice,
    TrendPrice,
    Correlation,
}

impl ChartKind {
    fn dir(self) -> &'static str {
        match self {
            ChartKind::CoinPrice => "coin_price",
            ChartKind::Polarity => "polarity",
            ChartKind::Objectivity => "objectivity",
            ChartKind::SentimentPrice => "sentiment_price",
            ChartKind::TweetVolume => "tweet_volume",
            ChartKind::TweetVolumePrice => "tweet_volume_price",
            ChartKind::TrendPrice => "google_trend_price",
            ChartKind::Correlation => "correlation",
        }
    }

    fn stem(self) -> &'static str {
        match self {
            ChartKind::CoinPrice => "price",
            ChartKind::Polarity => "polarity_dist",
            ChartKind::Objectivity => "object_neut_bar",
            ChartKind::SentimentPrice => "price_vs_polarity",
            ChartKind::TweetVolume => "tweet_volume",
            ChartKind::TweetVolumePrice => "price_vs_tweet",
            ChartKind::TrendPrice => "price_vs_google",
            ChartKind::Correlation => "correlation",
        }
    }

    /// `<plots_dir>/<kind dir>/<coin>_<stem>_<duration>.svg`
    pub fn path(self, plots_dir: &Path, coin: Coin, duration: Duration) -> PathBuf {
        plots_dir
            .join(self.dir())
            .join(format!("{coin}_{}_{duration}.svg", self.stem()))
    }
}
