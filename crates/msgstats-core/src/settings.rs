use clap::Parser;
use std::path::PathBuf;

use crate::error::{Result, StatsError};
use crate::time_utils::TimezoneHandler;

/// Every chart the report can draw, in default drawing order.
pub const CHART_NAMES: [&str; 6] = ["daily", "monthly", "sentiment", "weekday", "hourly", "words"];

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Analyze an exported chat-history archive
#[derive(Parser, Debug, Clone)]
#[command(
    name = "msgstats",
    about = "Message volume, sentiment and vocabulary statistics for exported chat archives",
    version
)]
pub struct Settings {
    /// Chat messages in JSON format (top-level `messages` array)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Timezone used to bucket timestamps (auto-detected if not specified)
    #[arg(long, env = "MSGSTATS_TIMEZONE", default_value = "auto")]
    pub timezone: String,

    /// Zone resolved from `timezone` by [`Settings::resolve`].
    #[arg(skip)]
    pub timezone_handler: TimezoneHandler,

    /// Number of most used words to rank
    #[arg(long, default_value = "42", value_parser = clap::value_parser!(u32).range(1..))]
    pub top_k: u32,

    /// How message text is split into words
    #[arg(long, default_value = "space", value_parser = ["space", "whitespace"])]
    pub split: String,

    /// Fail instead of averaging over one day when every message shares a date
    #[arg(long)]
    pub strict_span: bool,

    /// Chart to draw (repeatable; all charts when omitted)
    #[arg(long = "chart", value_parser = CHART_NAMES)]
    pub charts: Vec<String>,

    /// Output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Maximum bar width in terminal cells (10-200)
    #[arg(long, default_value = "40", value_parser = clap::value_parser!(u16).range(10..=200))]
    pub width: u16,

    /// Stop-word file, one word per line (built-in English list if omitted)
    #[arg(long)]
    pub stop_words: Option<PathBuf>,

    /// VADER-format sentiment lexicon (built-in lexicon if omitted)
    #[arg(long)]
    pub lexicon: Option<PathBuf>,

    /// Logging level
    #[arg(long, env = "MSGSTATS_LOG", default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse process arguments and resolve them.
    pub fn load() -> Result<Self> {
        Self::parse().resolve()
    }

    /// Same as [`Settings::load`] but with an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args)
            .map_err(|e| StatsError::Config(e.to_string()))?
            .resolve()
    }

    /// Resolve `"auto"` sentinel values, validate the timezone, fill in the
    /// default chart list and apply the `--debug` flag.
    pub fn resolve(mut self) -> Result<Self> {
        self.timezone_handler = TimezoneHandler::from_setting(&self.timezone)?;
        self.timezone = self.timezone_handler.name().to_string();

        if self.charts.is_empty() {
            self.charts = CHART_NAMES.iter().map(|c| c.to_string()).collect();
        } else {
            // Keep first occurrence order, drop repeats.
            let mut seen = Vec::with_capacity(self.charts.len());
            for chart in self.charts.drain(..) {
                if !seen.contains(&chart) {
                    seen.push(chart);
                }
            }
            self.charts = seen;
        }

        if self.debug {
            self.log_level = "DEBUG".to_string();
        }

        Ok(self)
    }

    /// Number of top words as a `usize`.
    pub fn top_k(&self) -> usize {
        self.top_k as usize
    }

    /// Whether the JSON output format was requested.
    pub fn wants_json(&self) -> bool {
        self.format == "json"
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
