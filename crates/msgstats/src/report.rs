//! Plain-text and JSON rendering of an analysis.
//!
//! Every chart is a titled list of labelled horizontal bars. Labels are
//! padded by display width so the bars line up regardless of script.

use std::fmt::Write as _;

use msgstats_core::formatting::{bar, format_count, format_number, format_signed};
use msgstats_core::models::{AnalysisResult, WEEKDAY_NAMES};
use msgstats_data::analysis::ArchiveAnalysis;
use unicode_width::UnicodeWidthStr;

/// One labelled bar of a chart.
struct Row {
    label: String,
    value: f64,
    annotation: String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Draw the named charts, in the given order, separated by blank lines.
///
/// Unknown chart names are skipped.
pub fn render_text(result: &AnalysisResult, charts: &[String], width: usize) -> String {
    let mut out = String::new();
    for name in charts {
        let section = match name.as_str() {
            "daily" => daily_chart(result, width),
            "monthly" => monthly_chart(result, width),
            "sentiment" => sentiment_chart(result, width),
            "weekday" => weekday_chart(result, width),
            "hourly" => hourly_chart(result, width),
            "words" => words_chart(result, width),
            _ => continue,
        };
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&section);
    }
    out
}

/// Pretty-printed JSON of the result and its metadata.
pub fn render_json(analysis: &ArchiveAnalysis) -> serde_json::Result<String> {
    serde_json::to_string_pretty(analysis)
}

// ── Charts ────────────────────────────────────────────────────────────────────

fn daily_chart(result: &AnalysisResult, width: usize) -> String {
    let rows = result
        .daily_counts
        .iter()
        .map(|(day, &count)| Row {
            label: day.clone(),
            value: count as f64,
            annotation: with_stickers(count, result.stickers_on(day)),
        })
        .collect::<Vec<_>>();
    bar_chart("Number of messages exchanged every day", &rows, width)
}

fn monthly_chart(result: &AnalysisResult, width: usize) -> String {
    let rows = result
        .monthly_counts
        .iter()
        .map(|(month, &count)| Row {
            label: month.clone(),
            value: count as f64,
            annotation: with_stickers(count, result.stickers_in(month)),
        })
        .collect::<Vec<_>>();
    bar_chart("Number of messages exchanged every month", &rows, width)
}

fn weekday_chart(result: &AnalysisResult, width: usize) -> String {
    let rows = WEEKDAY_NAMES
        .iter()
        .zip(result.weekday_averages)
        .map(|(name, average)| Row {
            label: name.to_string(),
            value: average,
            annotation: format_number(average, 2),
        })
        .collect::<Vec<_>>();
    bar_chart(
        "Average number of messages every day of the week",
        &rows,
        width,
    )
}

fn hourly_chart(result: &AnalysisResult, width: usize) -> String {
    let rows = result
        .hourly_averages
        .iter()
        .enumerate()
        .map(|(hour, &average)| Row {
            label: format!("{}:00", hour),
            value: average,
            annotation: format_number(average, 2),
        })
        .collect::<Vec<_>>();
    bar_chart(
        "Average number of messages every hour of the day",
        &rows,
        width,
    )
}

fn words_chart(result: &AnalysisResult, width: usize) -> String {
    let rows = result
        .top_words
        .iter()
        .map(|w| Row {
            label: w.word.clone(),
            value: w.count as f64,
            annotation: format_count(w.count),
        })
        .collect::<Vec<_>>();
    let title = format!("Our {} most used words", result.top_words.len());
    bar_chart(&title, &rows, width)
}

/// Net sentiment per day on a fixed -1..1 axis: negative days grow left of
/// the axis, positive days grow right.
fn sentiment_chart(result: &AnalysisResult, width: usize) -> String {
    let title = "Average sentiment over time";
    let mut out = heading(title);
    let label_width = label_width(result.daily_sentiment.keys().map(String::as_str));
    let half = (width / 2).max(1);

    for (day, &value) in &result.daily_sentiment {
        let left = if value < 0.0 { bar(-value, 1.0, half) } else { String::new() };
        let right = if value > 0.0 { bar(value, 1.0, half) } else { String::new() };
        let _ = writeln!(
            out,
            "{}  {}│{}  {}",
            pad(day, label_width),
            pad_left(&left, half),
            pad(&right, half),
            format_signed(value, 2),
        );
    }
    out
}

// ── Layout helpers ────────────────────────────────────────────────────────────

fn bar_chart(title: &str, rows: &[Row], width: usize) -> String {
    let mut out = heading(title);
    if rows.is_empty() {
        out.push_str("(no data)\n");
        return out;
    }

    let label_width = label_width(rows.iter().map(|r| r.label.as_str()));
    let max = rows.iter().map(|r| r.value).fold(0.0_f64, f64::max);
    for row in rows {
        let cells = bar(row.value, max, width);
        let _ = writeln!(
            out,
            "{}  {}  {}",
            pad(&row.label, label_width),
            pad(&cells, width),
            row.annotation,
        );
    }
    out
}

fn heading(title: &str) -> String {
    format!("{}\n{}\n", title, "─".repeat(title.width()))
}

fn with_stickers(count: u64, stickers: u64) -> String {
    if stickers == 0 {
        format_count(count)
    } else {
        format!("{} ({} stickers)", format_count(count), format_count(stickers))
    }
}

fn label_width<'a>(labels: impl Iterator<Item = &'a str>) -> usize {
    labels.map(UnicodeWidthStr::width).max().unwrap_or(0)
}

/// Right-pad `text` with spaces to `width` display cells.
fn pad(text: &str, width: usize) -> String {
    let gap = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(gap))
}

/// Left-pad `text` with spaces to `width` display cells.
fn pad_left(text: &str, width: usize) -> String {
    let gap = width.saturating_sub(text.width());
    format!("{}{}", " ".repeat(gap), text)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
