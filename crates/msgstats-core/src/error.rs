use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by msgstats.
#[derive(Error, Debug)]
pub enum StatsError {
    /// An archive could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive is not a valid JSON document.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The document or one of its message records does not have the
    /// expected shape.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// No messages were supplied to the analyzer.
    #[error("No messages to analyze")]
    EmptyInput,

    /// Every message falls on the same calendar day, so per-day and
    /// per-week averages cannot be computed.
    #[error("All messages fall on {date}; at least two calendar days are required")]
    InsufficientSpan { date: NaiveDate },

    /// A time-zone name is not a recognised IANA identifier.
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StatsError {
    /// Shorthand for building a [`StatsError::MalformedInput`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInput(reason.into())
    }
}

/// Convenience alias used throughout the msgstats crates.
pub type Result<T> = std::result::Result<T, StatsError>;
