//! Terminal output: run summaries, batch tables, collection windows and
//! correlation tables.
//!
//! Formatting lives here so pipeline code never prints, and every string the
//! CLI shows can be asserted on in tests.

use crate::analysis::CorrelationMatrix;
use crate::app::pipeline::{BatchOutcome, BatchStatus, RunOutput};
use crate::collect::PostQuery;
use crate::domain::{Coin, Duration, PipelineConfig};

/// Summary of one clean-score-aggregate run.
pub fn format_run_summary(config: &PipelineConfig, run: &RunOutput) -> String {
    let t = &run.totals;
    let mut out = String::new();

    out.push_str(&format!(
        "=== cs - {} sentiment ({}) ===\n",
        config.coin.display_name(),
        config.duration.period_label()
    ));
    out.push_str(&format!("Rows read: {}\n", run.rows_read));
    out.push_str(&format!("Posts kept ({}): {}\n", config.language, run.cleaned.len()));
    out.push_str(&format!("Days aggregated: {}\n", t.days));
    if let (Some(first), Some(last)) = (run.daily.first(), run.daily.last()) {
        out.push_str(&format!("Date range: {} .. {}\n", first.date, last.date));
    }
    out.push_str(&format!(
        "Positive: {:>6} ({:>5.1}%)\nNegative: {:>6} ({:>5.1}%)\nNeutral:  {:>6} ({:>5.1}%)\n",
        t.positive,
        t.share(t.positive) * 100.0,
        t.negative,
        t.share(t.negative) * 100.0,
        t.neutral,
        t.share(t.neutral) * 100.0,
    ));
    out.push_str(&format!("Cleaned: {}\n", config.cleaned_path().display()));
    out.push_str(&format!("Daily:   {}", config.daily_path().display()));

    out
}

/// One line per coin/duration of a `run-all` batch.
pub fn format_batch(template: &PipelineConfig, outcomes: &[BatchOutcome]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Data dir: {}\n", template.data_dir.display()));
    out.push_str(format!("{:<8} {:<9} {:<8} {:>6} {:>5}  {}", "coin", "duration", "status", "posts", "days", "note").trim_end());
    out.push('\n');
    out.push_str(&format!("{:-<8} {:-<9} {:-<8} {:->6} {:->5}  {:-<4}", "", "", "", "", "", ""));

    for o in outcomes {
        let line = match &o.status {
            BatchStatus::Done(run) => format!(
                "{:<8} {:<9} {:<8} {:>6} {:>5}",
                o.coin,
                o.duration,
                "ok",
                run.cleaned.len(),
                run.totals.days
            ),
            BatchStatus::Skipped(err) => {
                format!("{:<8} {:<9} {:<8} {:>6} {:>5}  {err}", o.coin, o.duration, "skipped", 0, 0)
            }
            BatchStatus::Failed(err) => {
                format!("{:<8} {:<9} {:<8} {:>6} {:>5}  {err}", o.coin, o.duration, "failed", "-", "-")
            }
        };
        out.push('\n');
        out.push_str(line.trim_end());
    }

    out
}

/// The collection windows a plan would query.
pub fn format_windows(coin: Coin, duration: Duration, plan: &[PostQuery]) -> String {
    let mut out = format!("{} {} plan: {} window(s)\n", coin.display_name(), duration, plan.len());
    for q in plan {
        let limit = q.limit.map(|n| n.to_string()).unwrap_or_else(|| "none".to_string());
        out.push_str(&format!("{} {}  limit={limit}\n", q.search, q.window));
    }
    out.trim_end().to_string()
}

/// Correlation matrix as an aligned table. Undefined coefficients print as `n/a`.
pub fn format_correlation(matrix: &CorrelationMatrix, days: usize) -> String {
    let width = matrix.labels.iter().map(|l| l.len()).max().unwrap_or(0).max(6);
    let mut out = format!("Correlation over {days} shared day(s):\n");

    out.push_str(&" ".repeat(width));
    for label in &matrix.labels {
        out.push_str(&format!(" {:>w$}", truncate(label, width), w = width));
    }

    for (i, label) in matrix.labels.iter().enumerate() {
        out.push('\n');
        out.push_str(&format!("{label:<width$}"));
        for j in 0..matrix.labels.len() {
            let v = matrix.values[(i, j)];
            let cell = if v.is_nan() { "n/a".to_string() } else { format!("{v:.3}") };
            out.push_str(&format!(" {cell:>width$}"));
        }
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use nalgebra::DMatrix;

    use crate::analysis::{SentimentTotals, aggregate_daily};
    use crate::collect::collection_plan;
    use crate::domain::{CleanedPost, SamplingMode, Sentiment};
    use crate::error::AppError;

    fn run() -> RunOutput {
        let date = NaiveDate::from_ymd_opt(2021, 3, 14).unwrap();
        let cleaned: Vec<CleanedPost> = [0.5, -0.2, 0.0, 0.1]
            .into_iter()
            .map(|p| CleanedPost {
                date,
                clean_text: "x".to_string(),
                subjectivity: 0.4,
                polarity: p,
                sentiment: Sentiment::from_polarity(p),
            })
            .collect();
        let daily = aggregate_daily(&cleaned).unwrap();
        let totals = SentimentTotals::from_daily(&daily);
        RunOutput {
            rows_read: 6,
            cleaned,
            daily,
            totals,
        }
    }

    #[test]
    fn run_summary_reports_counts_and_shares() {
        let config = PipelineConfig::builder(Coin::Bitcoin, Duration::Snapshot).build();
        let text = format_run_summary(&config, &run());
        assert!(text.starts_with("=== cs - Bitcoin sentiment (Mar 2021) ==="));
        assert!(text.contains("Rows read: 6"));
        assert!(text.contains("Posts kept (en): 4"));
        assert!(text.contains("Days aggregated: 1"));
        assert!(text.contains("Positive:      2 ( 50.0%)"));
        assert!(text.contains("Neutral:       1 ( 25.0%)"));
    }

    #[test]
    fn batch_table_marks_each_status() {
        let config = PipelineConfig::builder(Coin::Bitcoin, Duration::Snapshot).build();
        let outcomes = vec![
            BatchOutcome {
                coin: Coin::Bitcoin,
                duration: Duration::Snapshot,
                status: BatchStatus::Done(run()),
            },
            BatchOutcome {
                coin: Coin::Cardano,
                duration: Duration::Extended,
                status: BatchStatus::Failed(AppError::input("missing file")),
            },
        ];
        let text = format_batch(&config, &outcomes);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[3].starts_with("bitcoin  snapshot  ok"));
        assert!(lines[4].starts_with("cardano  extended  failed"));
        assert!(lines[4].ends_with("missing file"));
    }

    #[test]
    fn windows_list_every_query() {
        let plan = collection_plan(Coin::Cardano, Duration::Extended, SamplingMode::default());
        let text = format_windows(Coin::Cardano, Duration::Extended, &plan);
        assert_eq!(text.lines().count(), 49);
        assert!(text.contains("#Cardano [2018-01-01, 2018-01-02)  limit=5000"));
    }

    #[test]
    fn correlation_table_shows_na() {
        let matrix = CorrelationMatrix {
            labels: vec!["tweets".to_string(), "price".to_string()],
            values: DMatrix::from_row_slice(2, 2, &[1.0, f64::NAN, f64::NAN, 1.0]),
        };
        let text = format_correlation(&matrix, 3);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Correlation over 3 shared day(s):");
        assert_eq!(lines[2], "tweets  1.000    n/a");
        assert_eq!(lines[3], "price     n/a  1.000");
    }
}
