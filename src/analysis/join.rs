//! Date-keyed series and inner joins between them.
//!
//! The daily sentiment table and the external price / volume / trend tables
//! only line up on dates present in all of them, so every join is an inner join.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::DailyAggregate;
use crate::error::AppError;

/// One named numeric column keyed by date.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedSeries {
    pub name: String,
    pub points: BTreeMap<NaiveDate, f64>,
}

impl DatedSeries {
    pub fn new(name: impl Into<String>, points: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        Self {
            name: name.into(),
            points: points.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(day index from the first date, value)` pairs, for plotting.
    pub fn indexed(&self, origin: NaiveDate) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|(d, v)| ((*d - origin).num_days() as f64, *v))
            .collect()
    }
}

/// Columns of the daily table that take part in joins.
pub fn daily_series(daily: &[DailyAggregate]) -> Vec<DatedSeries> {
    vec![
        daily_column(daily, "tweets", |d| d.tweet_count as f64),
        daily_column(daily, "average_polarity", |d| d.average_polarity),
        daily_column(daily, "average_subjectivity", |d| d.average_subjectivity),
        daily_column(daily, "positive_percentage", |d| d.positive_percentage),
        daily_column(daily, "negative_percentage", |d| d.negative_percentage),
    ]
}

fn daily_column(daily: &[DailyAggregate], name: &str, value: fn(&DailyAggregate) -> f64) -> DatedSeries {
    DatedSeries::new(name, daily.iter().map(|d| (d.date, value(d))))
}

/// A rectangular table: shared dates, one value vector per column.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedFrame {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<(String, Vec<f64>)>,
}

impl JoinedFrame {
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn labels(&self) -> Vec<String> {
        self.columns.iter().map(|(n, _)| n.clone()).collect()
    }
}

/// Inner join on date. Fails when nothing overlaps.
pub fn join_series(series: &[DatedSeries]) -> Result<JoinedFrame, AppError> {
    let Some((first, rest)) = series.split_first() else {
        return Err(AppError::invalid("Nothing to join: no series given."));
    };

    let dates: Vec<NaiveDate> = first
        .points
        .keys()
        .filter(|d| rest.iter().all(|s| s.points.contains_key(d)))
        .copied()
        .collect();

    if dates.is_empty() {
        let names: Vec<&str> = series.iter().map(|s| s.name.as_str()).collect();
        return Err(AppError::invalid(format!(
            "Series have no dates in common: {}",
            names.join(", ")
        )));
    }

    let columns = series
        .iter()
        .map(|s| {
            let values = dates.iter().map(|d| s.points[d]).collect();
            (s.name.clone(), values)
        })
        .collect();

    Ok(JoinedFrame { dates, columns })
}
