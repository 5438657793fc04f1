//! CSV ingest.
//!
//! Every table the pipeline reads comes through here:
//!
//! - raw posts from a collector (`date`, `tweet`, `language`, optional `id`/`time`)
//! - cleaned posts written by a previous run
//! - daily sentiment rows written by a previous run
//! - external price / volume / trend series (`date` + one numeric column)
//! - custom lexicons (`word`, `polarity`, `subjectivity`)
//!
//! Headers are matched case-insensitively. Unknown columns are ignored. A
//! missing required column or a malformed row aborts the read: a partial table
//! would silently skew every daily figure downstream.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::StringRecord;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::analysis::DatedSeries;
use crate::domain::{CleanedPost, DailyAggregate, Post, Sentiment};
use crate::error::AppError;
use crate::io::export::DAILY_COLUMNS;
use crate::sentiment::{Lexicon, LexiconEntry};

/// Load a raw-post table.
pub fn read_raw_posts(path: &Path) -> Result<Vec<Post>, AppError> {
    let (mut reader, header_map) = open_csv(path, "raw post")?;
    require_columns(path, &header_map, &["date", "tweet", "language"])?;

    let mut posts = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| csv_error(path, idx, e))?;
        let line = record_line(&record, idx);

        let timestamp = parse_timestamp(
            get_required(&record, &header_map, "date").map_err(|e| row_error(path, line, e))?,
            get_optional(&record, &header_map, "time"),
        )
        .map_err(|e| row_error(path, line, e))?;

        posts.push(Post {
            id: get_optional(&record, &header_map, "id").map(str::to_string),
            timestamp,
            text: get_raw(&record, &header_map, "tweet").to_string(),
            language: get_optional(&record, &header_map, "language").map(str::to_string),
        });
    }

    debug!(path = %path.display(), rows = posts.len(), "read raw posts");
    Ok(posts)
}

/// Load a cleaned-post table (`date, Clean_Tweet, Subjectivity, Polarity, Sentiment`).
pub fn read_cleaned_posts(path: &Path) -> Result<Vec<CleanedPost>, AppError> {
    let (mut reader, header_map) = open_csv(path, "cleaned post")?;
    require_columns(
        path,
        &header_map,
        &["date", "clean_tweet", "subjectivity", "polarity", "sentiment"],
    )?;

    let mut posts = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| csv_error(path, idx, e))?;
        let line = record_line(&record, idx);
        let post = parse_cleaned_row(&record, &header_map).map_err(|e| row_error(path, line, e))?;
        posts.push(post);
    }

    debug!(path = %path.display(), rows = posts.len(), "read cleaned posts");
    Ok(posts)
}

fn parse_cleaned_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<CleanedPost, String> {
    let date = parse_timestamp(get_required(record, header_map, "date")?, None)?.date();
    let subjectivity = parse_f64(get_required(record, header_map, "subjectivity")?, "Subjectivity")?;
    let polarity = parse_f64(get_required(record, header_map, "polarity")?, "Polarity")?;
    let sentiment: Sentiment = get_required(record, header_map, "sentiment")?.parse()?;

    if sentiment != Sentiment::from_polarity(polarity) {
        return Err(format!(
            "Sentiment '{sentiment}' does not match polarity {polarity}."
        ));
    }

    Ok(CleanedPost {
        date,
        clean_text: get_raw(record, header_map, "clean_tweet").to_string(),
        subjectivity,
        polarity,
        sentiment,
    })
}

/// Load a daily sentiment table written by `write_daily_csv`.
pub fn read_daily_aggregates(path: &Path) -> Result<Vec<DailyAggregate>, AppError> {
    let (mut reader, header_map) = open_csv(path, "daily sentiment")?;
    require_columns(path, &header_map, &DAILY_COLUMNS)?;

    // Rows deserialize by (case-folded) column name.
    let headers: StringRecord = reader_headers(&mut reader, path)?
        .iter()
        .map(normalize_header_name)
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| csv_error(path, idx, e))?;
        let line = record_line(&record, idx);
        let row: DailyAggregate = record
            .deserialize(Some(&headers))
            .map_err(|e| row_error(path, line, e))?;
        rows.push(row);
    }

    debug!(path = %path.display(), rows = rows.len(), "read daily sentiment");
    Ok(rows)
}

/// Load an external `date` + value series.
///
/// `column` picks the value column by name; without it the first non-date
/// column is used. Blank cells are skipped, anything else that does not parse
/// as a number is an error. The series is named `name`.
pub fn read_series(path: &Path, column: Option<&str>, name: &str) -> Result<DatedSeries, AppError> {
    let (mut reader, header_map) = open_csv(path, "series")?;
    require_columns(path, &header_map, &["date"])?;

    let value_idx = match column {
        Some(c) => *header_map.get(&normalize_header_name(c)).ok_or_else(|| {
            AppError::input(format!("{}: missing value column `{c}`.", path.display()))
        })?,
        None => first_value_column(&reader_headers(&mut reader, path)?).ok_or_else(|| {
            AppError::input(format!("{}: no value column next to `date`.", path.display()))
        })?,
    };

    let mut points = Vec::new();
    let mut blanks = 0usize;
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| csv_error(path, idx, e))?;
        let line = record_line(&record, idx);

        let date = get_required(&record, &header_map, "date")
            .and_then(|d| parse_timestamp(d, None))
            .map_err(|e| row_error(path, line, e))?
            .date();

        let raw = record.get(value_idx).map(str::trim).unwrap_or("");
        if raw.is_empty() {
            blanks += 1;
            continue;
        }
        let value = parse_number(raw).map_err(|e| row_error(path, line, e))?;
        points.push((date, value));
    }

    if blanks > 0 {
        warn!(path = %path.display(), blanks, "skipped blank series values");
    }
    if points.is_empty() {
        return Err(AppError::input(format!("{}: series has no values.", path.display())));
    }

    Ok(DatedSeries::new(name, points))
}

#[derive(Debug, Deserialize)]
struct LexiconRow {
    word: String,
    polarity: f64,
    subjectivity: f64,
}

/// Load a lexicon (`word, polarity, subjectivity`).
pub fn read_lexicon(path: &Path) -> Result<Lexicon, AppError> {
    let (mut reader, header_map) = open_csv(path, "lexicon")?;
    require_columns(path, &header_map, &["word", "polarity", "subjectivity"])?;

    let headers: StringRecord = reader_headers(&mut reader, path)?
        .iter()
        .map(normalize_header_name)
        .collect();

    let mut entries = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| csv_error(path, idx, e))?;
        let line = record_line(&record, idx);
        let row: LexiconRow = record
            .deserialize(Some(&headers))
            .map_err(|e| row_error(path, line, e))?;

        let word = row.word.trim().to_string();
        if word.is_empty() || !row.polarity.is_finite() || !row.subjectivity.is_finite() {
            return Err(row_error(path, line, "Lexicon rows need a word and finite scores."));
        }
        entries.push((
            word,
            LexiconEntry {
                polarity: row.polarity,
                subjectivity: row.subjectivity,
            },
        ));
    }

    let lexicon = Lexicon::from_entries(entries);
    if lexicon.is_empty() {
        return Err(AppError::input(format!("{}: lexicon has no words.", path.display())));
    }
    debug!(path = %path.display(), words = lexicon.len(), "read lexicon");
    Ok(lexicon)
}

fn open_csv(path: &Path, what: &str) -> Result<(csv::Reader<File>, HashMap<String, usize>), AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open {what} CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(file);

    let headers = reader_headers(&mut reader, path)?;
    Ok((reader, build_header_map(&headers)))
}

fn reader_headers(reader: &mut csv::Reader<File>, path: &Path) -> Result<StringRecord, AppError> {
    reader
        .headers()
        .map(Clone::clone)
        .map_err(|e| AppError::input(format!("Failed to read CSV headers of '{}': {e}", path.display())))
}

fn require_columns(path: &Path, header_map: &HashMap<String, usize>, names: &[&str]) -> Result<(), AppError> {
    let missing: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| !header_map.contains_key(*name))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::input(format!(
            "{}: missing required column(s): {}",
            path.display(),
            missing.iter().map(|m| format!("`{m}`")).collect::<Vec<_>>().join(", ")
        )))
    }
}

/// Physical line a record starts on; quoted cells may span several lines.
fn record_line(record: &StringRecord, idx: usize) -> usize {
    record
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or(idx + 2)
}

fn csv_error(path: &Path, idx: usize, err: csv::Error) -> AppError {
    let line = err.position().map(|p| p.line() as usize).unwrap_or(idx + 2);
    row_error(path, line, format!("CSV parse error: {err}"))
}

fn row_error(path: &Path, line: usize, message: impl std::fmt::Display) -> AppError {
    AppError::input(format!("{}: line {line}: {message}", path.display()))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First occurrence wins for duplicated headers.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn first_value_column(headers: &StringRecord) -> Option<usize> {
    headers.iter().enumerate().find_map(|(idx, name)| {
        let name = normalize_header_name(name);
        (!name.is_empty() && name != "date").then_some(idx)
    })
}

fn normalize_header_name(name: &str) -> String {
    // UTF-8 CSVs exported by spreadsheets may carry a BOM on the first header.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

/// Untrimmed field, empty when absent. Used for free text.
fn get_raw<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> &'a str {
    header_map
        .get(name)
        .and_then(|idx| record.get(*idx))
        .unwrap_or("")
}

/// Accepts a bare date, `date time` (trailing zone names such as `UTC` are
/// ignored), or ISO `dateTtime`. A separate `time` column fills in the clock
/// when the date cell has none.
fn parse_timestamp(raw: &str, time: Option<&str>) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();
    let mut parts = raw.split_whitespace();
    let first = parts.next().ok_or_else(|| "Empty date.".to_string())?;

    let (day, clock) = match first.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (first, parts.next().or(time)),
    };

    let date = parse_date(day)?;
    let clock = match clock {
        Some(t) => parse_time(t).ok_or_else(|| format!("Invalid time '{t}' in '{raw}'."))?,
        None => NaiveTime::MIN,
    };
    Ok(date.and_time(clock))
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // ISO first; a few common spreadsheet layouts are accepted as well.
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, DD/MM/YYYY, DD-MM-YYYY, YYYY/MM/DD."
    ))
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    // Drop fractional seconds and offsets (`12:00:00.000Z`, `12:00:00+00:00`).
    let s = s.trim_end_matches('Z');
    let s = s.split(['.', '+']).next().unwrap_or(s);
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

fn parse_f64(s: &str, name: &str) -> Result<f64, String> {
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("Invalid number '{s}' in `{name}`."))
}

/// Numbers from price exports may carry a currency sign or thousands separators.
fn parse_number(s: &str) -> Result<f64, String> {
    let cleaned: String = s.chars().filter(|c| !matches!(c, '$' | ',' | ' ')).collect();
    parse_f64(&cleaned, "value")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_csv(name: &str, body: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cs-ingest-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{name}.csv"));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn timestamps_in_common_layouts() {
        let d = NaiveDate::from_ymd_opt(2021, 3, 14).unwrap();
        assert_eq!(parse_timestamp("2021-03-14", None).unwrap(), d.and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(
            parse_timestamp("2021-03-14", Some("13:05:09")).unwrap(),
            d.and_hms_opt(13, 5, 9).unwrap()
        );
        assert_eq!(
            parse_timestamp("2021-03-14 13:05:09 UTC", None).unwrap(),
            d.and_hms_opt(13, 5, 9).unwrap()
        );
        assert_eq!(
            parse_timestamp("2021-03-14T13:05:09.123Z", None).unwrap(),
            d.and_hms_opt(13, 5, 9).unwrap()
        );
        assert_eq!(parse_timestamp("14/03/2021", None).unwrap().date(), d);
        assert!(parse_timestamp("yesterday", None).is_err());
        assert!(parse_timestamp("2021-03-14 noon", None).is_err());
    }

    #[test]
    fn raw_posts_keep_text_verbatim() {
        let path = temp_csv(
            "raw",
            "id,date,time,tweet,language,username\n\
             1,2021-03-14,10:00:00,\"#Bitcoin to the moon!\n  yes\",en,alice\n\
             2,2021-03-15,11:00:00,,fr,bob\n\
             3,2021-03-15,12:00:00,\"a, b\",,carol\n",
        );
        let posts = read_raw_posts(&path).unwrap();
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[0].text, "#Bitcoin to the moon!\n  yes");
        assert_eq!(posts[0].id.as_deref(), Some("1"));
        assert_eq!(posts[1].text, "");
        assert_eq!(posts[1].language.as_deref(), Some("fr"));
        assert_eq!(posts[2].language, None);
        assert_eq!(posts[2].text, "a, b");
    }

    #[test]
    fn raw_posts_require_schema_columns() {
        let path = temp_csv("noschema", "date,text\n2021-03-14,hello\n");
        let err = read_raw_posts(&path).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(err.message().contains("`tweet`"));
        assert!(err.message().contains("`language`"));
    }

    #[test]
    fn malformed_row_aborts_the_read() {
        let path = temp_csv("baddate", "date,tweet,language\n2021-03-14,ok,en\nnot-a-date,x,en\n");
        let err = read_raw_posts(&path).unwrap_err();
        assert!(err.message().contains("line 3"));
    }

    #[test]
    fn error_line_counts_physical_lines() {
        let path = temp_csv(
            "multiline",
            "date,tweet,language\n2021-03-14,\"first\nsecond\nthird\",en\nnot-a-date,x,en\n",
        );
        let err = read_raw_posts(&path).unwrap_err();
        assert!(err.message().contains("line 5"), "{}", err.message());
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = read_raw_posts(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
    }

    #[test]
    fn cleaned_posts_accept_pandas_index_column() {
        let path = temp_csv(
            "cleaned",
            ",date,Clean_Tweet,Subjectivity,Polarity,Sentiment\n\
             0,2021-03-14,Bitcoin to the moon!,0.7,0.75,Positive\n\
             1,2021-03-14,,0.0,0.0,Neutral\n",
        );
        let posts = read_cleaned_posts(&path).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].sentiment, Sentiment::Positive);
        assert_eq!(posts[1].clean_text, "");
    }

    #[test]
    fn cleaned_label_must_match_polarity() {
        let path = temp_csv(
            "mislabel",
            "date,Clean_Tweet,Subjectivity,Polarity,Sentiment\n2021-03-14,x,0.1,-0.2,Positive\n",
        );
        assert!(read_cleaned_posts(&path).is_err());
    }

    #[test]
    fn series_picks_named_or_first_value_column() {
        let path = temp_csv(
            "price",
            "Date,Open,Close\n2021-03-14,\"$58,000.5\",59000\n2021-03-15,1,\n2021-03-16,2,61000.25\n",
        );
        let close = read_series(&path, Some("Close"), "price").unwrap();
        assert_eq!(close.name, "price");
        assert_eq!(close.len(), 2);

        let open = read_series(&path, None, "open").unwrap();
        let first = open.points.values().next().copied().unwrap();
        assert!((first - 58000.5).abs() < 1e-9);

        assert!(read_series(&path, Some("Volume"), "v").is_err());
    }

    #[test]
    fn lexicon_file_replaces_words() {
        let path = temp_csv("lexicon", "Word,Polarity,Subjectivity\nrocket,0.9,0.5\nrug,-0.9,0.8\n");
        let lex = read_lexicon(&path).unwrap();
        assert_eq!(lex.len(), 2);
        assert!(lex.entry("rocket").is_some());
        assert!(lex.entry("good").is_none());

        let bad = temp_csv("badlexicon", "word,polarity,subjectivity\nrocket,high,0.5\n");
        assert!(read_lexicon(&bad).unwrap_err().message().contains("line 2"));
    }
}
