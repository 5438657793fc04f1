//! Daily aggregator: cleaned posts -> one sentiment row per calendar date.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{CleanedPost, DailyAggregate, Sentiment};
use crate::error::AppError;

#[derive(Debug, Default)]
struct DayTotals {
    count: usize,
    positive: usize,
    negative: usize,
    neutral: usize,
    polarity_sum: f64,
    subjectivity_sum: f64,
}

impl DayTotals {
    fn add(&mut self, post: &CleanedPost) {
        self.count += 1;
        match post.sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Negative => self.negative += 1,
            Sentiment::Neutral => self.neutral += 1,
        }
        self.polarity_sum += post.polarity;
        self.subjectivity_sum += post.subjectivity;
    }

    fn finish(self, date: NaiveDate) -> DailyAggregate {
        // `count >= 1` for every group that exists.
        let n = self.count as f64;
        let positive_percentage = self.positive as f64 / n;
        let negative_percentage = self.negative as f64 / n;
        let objective_fraction = (self.positive + self.negative) as f64 / n;

        DailyAggregate {
            date,
            tweet_count: self.count,
            positive_count: self.positive,
            negative_count: self.negative,
            neutral_count: self.neutral,
            average_polarity: self.polarity_sum / n,
            average_subjectivity: self.subjectivity_sum / n,
            positive_percentage,
            negative_percentage,
            objective_fraction,
            neutral_fraction: 1.0 - objective_fraction,
        }
    }
}

/// Group cleaned posts by date, sorted by date ascending.
///
/// An empty input is a caller error: skip empty batches before aggregating.
pub fn aggregate_daily(posts: &[CleanedPost]) -> Result<Vec<DailyAggregate>, AppError> {
    if posts.is_empty() {
        return Err(AppError::invalid(
            "Cannot aggregate an empty cleaned-post table (no English posts in this batch).",
        ));
    }

    let mut days: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();
    for post in posts {
        days.entry(post.date).or_default().add(post);
    }

    let rows: Vec<DailyAggregate> = days.into_iter().map(|(date, totals)| totals.finish(date)).collect();
    debug!(posts = posts.len(), days = rows.len(), "aggregated daily sentiment");
    Ok(rows)
}

/// Batch-wide totals over already aggregated days.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentTotals {
    pub days: usize,
    pub tweets: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentTotals {
    pub fn from_daily(daily: &[DailyAggregate]) -> Self {
        daily.iter().fold(
            SentimentTotals {
                days: daily.len(),
                tweets: 0,
                positive: 0,
                negative: 0,
                neutral: 0,
            },
            |mut acc, d| {
                acc.tweets += d.tweet_count;
                acc.positive += d.positive_count;
                acc.negative += d.negative_count;
                acc.neutral += d.neutral_count;
                acc
            },
        )
    }

    /// Share of `count` in all tweets; 0 when there are none.
    pub fn share(&self, count: usize) -> f64 {
        if self.tweets == 0 {
            0.0
        } else {
            count as f64 / self.tweets as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn cleaned(date: NaiveDate, polarity: f64, subjectivity: f64) -> CleanedPost {
        CleanedPost {
            date,
            clean_text: String::new(),
            subjectivity,
            polarity,
            sentiment: Sentiment::from_polarity(polarity),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, d).unwrap()
    }

    #[test]
    fn empty_table_is_invalid_input() {
        let err = aggregate_daily(&[]).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn one_positive_one_negative_day() {
        let rows = aggregate_daily(&[cleaned(day(14), 0.75, 0.7), cleaned(day(14), -0.65, 0.68)]).unwrap();
        assert_eq!(rows.len(), 1);
        let r = &rows[0];
        assert_eq!(r.date, day(14));
        assert_eq!(r.tweet_count, 2);
        assert_eq!((r.positive_count, r.negative_count, r.neutral_count), (1, 1, 0));
        assert!((r.positive_percentage - 0.5).abs() < 1e-12);
        assert!((r.negative_percentage - 0.5).abs() < 1e-12);
        assert!((r.objective_fraction - 1.0).abs() < 1e-12);
        assert!(r.neutral_fraction.abs() < 1e-12);
        assert!((r.average_polarity - 0.05).abs() < 1e-12);
        assert!((r.average_subjectivity - 0.69).abs() < 1e-12);
    }

    #[test]
    fn rows_are_unique_and_sorted_by_date() {
        let posts = vec![
            cleaned(day(16), 0.0, 0.0),
            cleaned(day(14), 0.2, 0.1),
            cleaned(day(16), -0.2, 0.3),
            cleaned(day(15), 0.0, 0.0),
            cleaned(day(14), 0.0, 0.0),
        ];
        let rows = aggregate_daily(&posts).unwrap();
        let dates: Vec<_> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(14), day(15), day(16)]);
        assert_eq!(rows[0].tweet_count, 2);
        assert_eq!(rows[0].neutral_count, 1);
        assert!((rows[1].neutral_fraction - 1.0).abs() < 1e-12);
    }

    #[test]
    fn partition_and_conservation_hold_for_random_batches() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let n = rng.gen_range(1..300);
            let posts: Vec<CleanedPost> = (0..n)
                .map(|_| {
                    let d = day(rng.gen_range(1..=31));
                    // A third of the posts land exactly on zero.
                    let polarity = match rng.gen_range(0..3) {
                        0 => 0.0,
                        _ => rng.gen_range(-1.0..=1.0),
                    };
                    cleaned(d, polarity, rng.gen_range(0.0..=1.0))
                })
                .collect();

            let rows = aggregate_daily(&posts).unwrap();
            let total: usize = rows.iter().map(|r| r.tweet_count).sum();
            assert_eq!(total, n);

            for r in &rows {
                assert!(r.tweet_count > 0);
                assert_eq!(r.positive_count + r.negative_count + r.neutral_count, r.tweet_count);
                let sum = r.positive_percentage + r.negative_percentage + r.neutral_fraction;
                assert!((sum - 1.0).abs() < 1e-9, "partition broken on {}: {sum}", r.date);
                assert!((-1.0..=1.0).contains(&r.average_polarity));
            }

            let totals = SentimentTotals::from_daily(&rows);
            assert_eq!(totals.tweets, n);
            assert_eq!(totals.days, rows.len());
        }
    }

    #[test]
    fn totals_share_handles_zero() {
        let totals = SentimentTotals::from_daily(&[]);
        assert_eq!(totals.share(0), 0.0);
    }
}
