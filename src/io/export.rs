//! CSV exports.
//!
//! Column names are a stable contract with the charting side and with any
//! downstream notebook, so they are spelled out here exactly once.

use std::fs::{File, create_dir_all, remove_file};
use std::io::ErrorKind;
use std::path::Path;

use tracing::info;

use crate::analysis::CorrelationMatrix;
use crate::domain::{CleanedPost, DailyAggregate, Post};
use crate::error::AppError;

pub const RAW_POST_COLUMNS: [&str; 5] = ["id", "date", "time", "tweet", "language"];

pub const CLEANED_POST_COLUMNS: [&str; 5] = ["date", "Clean_Tweet", "Subjectivity", "Polarity", "Sentiment"];

pub const DAILY_COLUMNS: [&str; 11] = [
    "date",
    "tweets",
    "positive_sentiment",
    "negative_sentiment",
    "neutral_sentiment",
    "average_polarity",
    "average_subjectivity",
    "positive_percentage",
    "negative_percentage",
    "objective",
    "neutral",
];

/// Write posts in the collector's raw schema.
pub fn write_raw_posts(path: &Path, posts: &[Post]) -> Result<(), AppError> {
    let mut writer = create_writer(path)?;
    write_row(&mut writer, path, RAW_POST_COLUMNS)?;

    for post in posts {
        write_row(
            &mut writer,
            path,
            [
                post.id.clone().unwrap_or_default(),
                post.timestamp.date().to_string(),
                post.timestamp.time().format("%H:%M:%S").to_string(),
                post.text.clone(),
                post.language.clone().unwrap_or_default(),
            ],
        )?;
    }

    finish(writer, path, posts.len())
}

pub fn write_cleaned_csv(path: &Path, posts: &[CleanedPost]) -> Result<(), AppError> {
    let mut writer = create_writer(path)?;
    write_row(&mut writer, path, CLEANED_POST_COLUMNS)?;

    for p in posts {
        write_row(
            &mut writer,
            path,
            [
                p.date.to_string(),
                p.clean_text.clone(),
                p.subjectivity.to_string(),
                p.polarity.to_string(),
                p.sentiment.to_string(),
            ],
        )?;
    }

    finish(writer, path, posts.len())
}

pub fn write_daily_csv(path: &Path, rows: &[DailyAggregate]) -> Result<(), AppError> {
    let mut writer = create_writer(path)?;
    write_row(&mut writer, path, DAILY_COLUMNS)?;

    for r in rows {
        write_row(
            &mut writer,
            path,
            [
                r.date.to_string(),
                r.tweet_count.to_string(),
                r.positive_count.to_string(),
                r.negative_count.to_string(),
                r.neutral_count.to_string(),
                r.average_polarity.to_string(),
                r.average_subjectivity.to_string(),
                r.positive_percentage.to_string(),
                r.negative_percentage.to_string(),
                r.objective_fraction.to_string(),
                r.neutral_fraction.to_string(),
            ],
        )?;
    }

    finish(writer, path, rows.len())
}

/// Square matrix with a leading `series` label column. Undefined cells are empty.
pub fn write_correlation_csv(path: &Path, matrix: &CorrelationMatrix) -> Result<(), AppError> {
    let mut writer = create_writer(path)?;

    let header = std::iter::once("series".to_string()).chain(matrix.labels.iter().cloned());
    write_row(&mut writer, path, header)?;

    for (i, label) in matrix.labels.iter().enumerate() {
        let cells = (0..matrix.labels.len()).map(|j| {
            let v = matrix.values[(i, j)];
            if v.is_nan() { String::new() } else { format!("{v:.6}") }
        });
        write_row(&mut writer, path, std::iter::once(label.clone()).chain(cells))?;
    }

    finish(writer, path, matrix.labels.len())
}

/// Create parent directories as needed.
pub fn ensure_parent_dir(path: &Path) -> Result<(), AppError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => create_dir_all(dir)
            .map_err(|e| AppError::output(format!("Failed to create directory '{}': {e}", dir.display()))),
        _ => Ok(()),
    }
}

/// Delete an output left by an earlier run. A missing file is fine.
pub fn remove_stale(path: &Path) -> Result<(), AppError> {
    match remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "removed stale output");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::output(format!("Failed to remove '{}': {e}", path.display()))),
    }
}

fn create_writer(path: &Path) -> Result<csv::Writer<File>, AppError> {
    ensure_parent_dir(path)?;
    let file = File::create(path)
        .map_err(|e| AppError::output(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    Ok(csv::Writer::from_writer(file))
}

fn write_row<I, T>(writer: &mut csv::Writer<File>, path: &Path, row: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    writer
        .write_record(row)
        .map_err(|e| AppError::output(format!("Failed to write export CSV '{}': {e}", path.display())))
}

fn finish(mut writer: csv::Writer<File>, path: &Path, rows: usize) -> Result<(), AppError> {
    writer
        .flush()
        .map_err(|e| AppError::output(format!("Failed to flush export CSV '{}': {e}", path.display())))?;
    info!(path = %path.display(), rows, "wrote CSV");
    Ok(())
}
