//! Chart builders.
//!
//! Each public function draws one SVG file. Data prep (binning, axis ranges,
//! colours) lives in small pure helpers so it can be tested without touching
//! the file system.

use std::error::Error;
use std::path::Path;

use chrono::{Days, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use crate::analysis::{CorrelationMatrix, DatedSeries, join_series};
use crate::domain::{CleanedPost, DailyAggregate};
use crate::error::AppError;
use crate::io::export::ensure_parent_dir;

pub const POLARITY_BINS: usize = 60;

const SIZE: (u32, u32) = (1024, 768);

const POSITIVE_COLOR: RGBColor = RGBColor(31, 119, 180);
const NEGATIVE_COLOR: RGBColor = RGBColor(214, 39, 40);
const NEUTRAL_COLOR: RGBColor = RGBColor(150, 150, 150);
const HISTOGRAM_COLOR: RGBColor = RGBColor(128, 0, 128);
const LEFT_COLOR: RGBColor = RGBColor(31, 119, 180);
const RIGHT_COLOR: RGBColor = RGBColor(44, 160, 44);
const MISSING_COLOR: RGBColor = RGBColor(200, 200, 200);

type DrawResult = Result<(), Box<dyn Error>>;

/// Distribution of per-post polarity over [-1, 1].
pub fn polarity_histogram(path: &Path, posts: &[CleanedPost], title: &str) -> Result<(), AppError> {
    let polarities: Vec<f64> = posts.iter().map(|p| p.polarity).collect();
    let counts = histogram_counts(&polarities, POLARITY_BINS, -1.0, 1.0);
    let y_max = counts.iter().copied().max().unwrap_or(0).max(1) as f64 * 1.05;
    let width = 2.0 / POLARITY_BINS as f64;

    render(path, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 24))
            .margin(16)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(-1.0f64..1.0f64, 0.0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Polarity")
            .y_desc("Volume of Tweets")
            .draw()?;

        chart.draw_series(counts.iter().enumerate().map(|(i, &count)| {
            let x0 = -1.0 + i as f64 * width;
            Rectangle::new([(x0, 0.0), (x0 + width, count as f64)], HISTOGRAM_COLOR.filled())
        }))?;

        Ok(())
    })
}

/// Stacked positive / negative / neutral shares, one bar per day.
pub fn sentiment_breakdown(path: &Path, daily: &[DailyAggregate], title: &str) -> Result<(), AppError> {
    if daily.is_empty() {
        return Err(AppError::invalid("No daily rows to chart."));
    }
    let dates: Vec<NaiveDate> = daily.iter().map(|d| d.date).collect();
    let x_max = daily.len() as f64 - 0.5;

    render(path, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 24))
            .margin(16)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5f64..x_max, 0.0f64..1.0f64)?;

        let x_fmt = |v: &f64| index_label(&dates, *v);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(dates.len().min(12))
            .x_label_formatter(&x_fmt)
            .x_desc("Date")
            .y_desc("% Breakdown")
            .draw()?;

        let bar = |i: usize, lo: f64, hi: f64, color: RGBColor| {
            let x = i as f64;
            Rectangle::new([(x - 0.4, lo), (x + 0.4, hi)], color.filled())
        };
        let swatch = |color: RGBColor| move |(x, y): (i32, i32)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled());

        chart
            .draw_series(
                daily
                    .iter()
                    .enumerate()
                    .map(|(i, d)| bar(i, 0.0, d.positive_percentage, POSITIVE_COLOR)),
            )?
            .label("Positive Tweets")
            .legend(swatch(POSITIVE_COLOR));

        chart
            .draw_series(daily.iter().enumerate().map(|(i, d)| {
                let lo = d.positive_percentage;
                bar(i, lo, lo + d.negative_percentage, NEGATIVE_COLOR)
            }))?
            .label("Negative Tweets")
            .legend(swatch(NEGATIVE_COLOR));

        chart
            .draw_series(daily.iter().enumerate().map(|(i, d)| {
                let lo = d.positive_percentage + d.negative_percentage;
                bar(i, lo, lo + d.neutral_fraction, NEUTRAL_COLOR)
            }))?
            .label("Neutral Tweets")
            .legend(swatch(NEUTRAL_COLOR));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        Ok(())
    })
}

/// One series over time (price, tweet volume, ...).
pub fn line_chart(path: &Path, series: &DatedSeries, title: &str, y_label: &str) -> Result<(), AppError> {
    let origin = series
        .points
        .keys()
        .next()
        .copied()
        .ok_or_else(|| AppError::invalid(format!("Series `{}` is empty.", series.name)))?;
    let points = series.indexed(origin);
    let x_max = points.last().map(|p| p.0).unwrap_or(0.0).max(1.0);
    let (y_lo, y_hi) = padded_range(points.iter().map(|p| p.1));

    render(path, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 24))
            .margin(16)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(0.0f64..x_max, y_lo..y_hi)?;

        let x_fmt = |v: &f64| offset_label(origin, *v);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(8)
            .x_label_formatter(&x_fmt)
            .x_desc("Date")
            .y_desc(y_label)
            .draw()?;

        chart.draw_series(LineSeries::new(points.iter().copied(), &LEFT_COLOR))?;
        Ok(())
    })
}

/// Two series on shared dates, left and right y axes.
pub fn dual_axis_chart(
    path: &Path,
    left: &DatedSeries,
    right: &DatedSeries,
    title: &str,
    left_label: &str,
    right_label: &str,
) -> Result<(), AppError> {
    let frame = join_series(&[left.clone(), right.clone()])?;
    let origin = frame.dates[0];
    let xs: Vec<f64> = frame.dates.iter().map(|d| (*d - origin).num_days() as f64).collect();
    let left_values = &frame.columns[0].1;
    let right_values = &frame.columns[1].1;

    let x_max = xs.last().copied().unwrap_or(0.0).max(1.0);
    let (l_lo, l_hi) = padded_range(left_values.iter().copied());
    let (r_lo, r_hi) = padded_range(right_values.iter().copied());

    render(path, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 24))
            .margin(16)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .right_y_label_area_size(90)
            .build_cartesian_2d(0.0f64..x_max, l_lo..l_hi)?
            .set_secondary_coord(0.0f64..x_max, r_lo..r_hi);

        let x_fmt = |v: &f64| offset_label(origin, *v);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_labels(8)
            .x_label_formatter(&x_fmt)
            .x_desc("Date")
            .y_desc(left_label)
            .draw()?;
        chart.configure_secondary_axes().y_desc(right_label).draw()?;

        chart
            .draw_series(LineSeries::new(
                xs.iter().copied().zip(left_values.iter().copied()),
                &LEFT_COLOR,
            ))?
            .label(left_label)
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], LEFT_COLOR));

        chart
            .draw_secondary_series(LineSeries::new(
                xs.iter().copied().zip(right_values.iter().copied()),
                &RIGHT_COLOR,
            ))?
            .label(right_label)
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RIGHT_COLOR));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        Ok(())
    })
}

/// Square heat map of a correlation matrix, blue (-1) through white to red (+1).
pub fn correlation_heatmap(path: &Path, matrix: &CorrelationMatrix, title: &str) -> Result<(), AppError> {
    let n = matrix.labels.len() as i32;
    if n == 0 {
        return Err(AppError::invalid("Correlation matrix is empty."));
    }

    render(path, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 24))
            .margin(16)
            .x_label_area_size(60)
            .y_label_area_size(170)
            .build_cartesian_2d((0..n).into_segmented(), (0..n).into_segmented())?;

        // Row 0 is drawn at the top.
        let x_fmt = |v: &SegmentValue<i32>| segment_label(&matrix.labels, v, false);
        let y_fmt = |v: &SegmentValue<i32>| segment_label(&matrix.labels, v, true);
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(n as usize)
            .y_labels(n as usize)
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .draw()?;

        let cells = || (0..n).flat_map(move |row| (0..n).map(move |col| (row, col)));

        chart.draw_series(cells().map(|(row, col)| {
            let v = matrix.values[(row as usize, col as usize)];
            let y = n - 1 - row;
            Rectangle::new(
                [
                    (SegmentValue::Exact(col), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(col + 1), SegmentValue::Exact(y + 1)),
                ],
                diverging_color(v).filled(),
            )
        }))?;

        chart.draw_series(cells().map(|(row, col)| {
            let v = matrix.values[(row as usize, col as usize)];
            let text = if v.is_nan() { "n/a".to_string() } else { format!("{v:.2}") };
            Text::new(
                text,
                (SegmentValue::CenterOf(col), SegmentValue::CenterOf(n - 1 - row)),
                ("sans-serif", 14).into_font(),
            )
        }))?;

        Ok(())
    })
}

fn render<F>(path: &Path, draw: F) -> Result<(), AppError>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> DrawResult,
{
    ensure_parent_dir(path)?;
    let root = SVGBackend::new(path, SIZE).into_drawing_area();

    let drawn = (|| -> DrawResult {
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
        Ok(())
    })();

    drawn.map_err(|e| AppError::output(format!("Failed to render chart '{}': {e}", path.display())))?;
    info!(path = %path.display(), "wrote chart");
    Ok(())
}

/// Equal-width bins over `[lo, hi]`; `hi` itself lands in the last bin.
/// Values outside the range or not finite are ignored.
pub fn histogram_counts(values: &[f64], bins: usize, lo: f64, hi: f64) -> Vec<usize> {
    let mut counts = vec![0; bins];
    if bins == 0 || lo.is_nan() || hi.is_nan() || lo >= hi {
        return counts;
    }

    let width = (hi - lo) / bins as f64;
    for &v in values {
        if !v.is_finite() || v < lo || v > hi {
            continue;
        }
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
}

/// Min/max of the finite values with 5% head room; never a zero-width range.
pub fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if lo == hi {
        let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
        return (lo - pad, hi + pad);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

/// White at 0, fading to blue at -1 and red at +1. Undefined values are grey.
pub fn diverging_color(v: f64) -> RGBColor {
    if !v.is_finite() {
        return MISSING_COLOR;
    }
    let t = v.clamp(-1.0, 1.0);
    let (r, g, b) = if t >= 0.0 { (178u8, 24u8, 43u8) } else { (33u8, 102u8, 172u8) };
    let amount = t.abs();
    let fade = |c: u8| (255.0 - (255.0 - c as f64) * amount).round() as u8;
    RGBColor(fade(r), fade(g), fade(b))
}

fn index_label(dates: &[NaiveDate], v: f64) -> String {
    let idx = v.round();
    if idx < 0.0 || (v - idx).abs() > 1e-6 {
        return String::new();
    }
    dates
        .get(idx as usize)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn offset_label(origin: NaiveDate, v: f64) -> String {
    if v < 0.0 {
        return String::new();
    }
    origin
        .checked_add_days(Days::new(v.round() as u64))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn segment_label(labels: &[String], v: &SegmentValue<i32>, reversed: bool) -> String {
    let SegmentValue::CenterOf(i) = v else {
        return String::new();
    };
    let n = labels.len() as i32;
    let idx = if reversed { n - 1 - *i } else { *i };
    usize::try_from(idx)
        .ok()
        .and_then(|idx| labels.get(idx))
        .cloned()
        .unwrap_or_default()
}
