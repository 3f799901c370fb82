use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weekday names in presentation order (Sunday first).
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Index of `weekday` into Sunday-first slot arrays such as
/// [`AnalysisResult::weekday_counts`].
pub fn weekday_slot(weekday: Weekday) -> usize {
    weekday.num_days_from_sunday() as usize
}

/// A single chat message read from an exported archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unix epoch seconds when the message was sent.
    pub timestamp: i64,
    /// Message text, absent for stickers, attachments and similar records.
    #[serde(default)]
    pub content: Option<String>,
    /// Whether the record carried a sticker marker.
    #[serde(default)]
    pub has_sticker: bool,
}

impl Message {
    /// Build a plain text message.
    pub fn text(timestamp: i64, content: impl Into<String>) -> Self {
        Self {
            timestamp,
            content: Some(content.into()),
            has_sticker: false,
        }
    }

    /// Build a sticker message without content.
    pub fn sticker(timestamp: i64) -> Self {
        Self {
            timestamp,
            content: None,
            has_sticker: true,
        }
    }

    /// The message content when present and non-empty.
    pub fn non_empty_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }
}

/// Polarity breakdown produced by a sentiment scorer.
///
/// `positive`, `neutral` and `negative` lie in `[0, 1]`; `compound` lies in
/// `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
    pub compound: f64,
}

impl SentimentScores {
    /// Net sentiment: `positive - negative`.
    pub fn net(&self) -> f64 {
        self.positive - self.negative
    }
}

/// One entry of the ranked vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

/// Earliest and latest message seen during aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSpan {
    /// Local calendar date of the earliest message.
    pub first_date: NaiveDate,
    /// Local calendar date of the latest message.
    pub last_date: NaiveDate,
    /// Epoch seconds of the earliest message.
    pub first_timestamp: i64,
    /// Epoch seconds of the latest message.
    pub last_timestamp: i64,
    /// Whole calendar days between `first_date` and `last_date`.
    pub num_days: i64,
}

impl MessageSpan {
    /// `true` when `date` lies within the inclusive span.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first_date <= date && date <= self.last_date
    }
}

/// Every metric derived from one traversal of a message collection.
///
/// Built once by the aggregation engine and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Number of messages aggregated.
    pub message_count: usize,
    /// Messages per `YYYY-MM-DD` day.
    pub daily_counts: BTreeMap<String, u64>,
    /// Sticker messages per day; only days with stickers appear.
    pub daily_sticker_counts: BTreeMap<String, u64>,
    /// Messages per `YYYY-MM` month.
    pub monthly_counts: BTreeMap<String, u64>,
    /// Sticker messages per month; only months with stickers appear.
    pub monthly_sticker_counts: BTreeMap<String, u64>,
    /// Messages per hour of day, index 0..=23.
    pub hourly_counts: [u64; 24],
    /// Messages per weekday, Sunday first (see [`WEEKDAY_NAMES`]).
    pub weekday_counts: [u64; 7],
    /// Average net sentiment per day.
    pub daily_sentiment: BTreeMap<String, f64>,
    /// Frequency of every normalised word that passed the filters.
    pub word_frequencies: BTreeMap<String, u64>,
    /// Most frequent words, highest count first.
    pub top_words: Vec<WordCount>,
    /// First/last message bookkeeping.
    pub span: MessageSpan,
    /// Day count used as the divisor for the averages below.
    pub average_divisor_days: i64,
    /// Average messages per week for each weekday, Sunday first.
    pub weekday_averages: [f64; 7],
    /// Average messages per day for each hour.
    pub hourly_averages: [f64; 24],
}

impl AnalysisResult {
    /// Sticker count for `day`, zero when the day had none.
    pub fn stickers_on(&self, day: &str) -> u64 {
        self.daily_sticker_counts.get(day).copied().unwrap_or(0)
    }

    /// Sticker count for `month`, zero when the month had none.
    pub fn stickers_in(&self, month: &str) -> u64 {
        self.monthly_sticker_counts.get(month).copied().unwrap_or(0)
    }

    /// Total sticker messages across the archive.
    pub fn total_stickers(&self) -> u64 {
        self.daily_sticker_counts.values().sum()
    }

    /// Raw message count for `weekday`.
    pub fn weekday_count(&self, weekday: Weekday) -> u64 {
        self.weekday_counts[weekday_slot(weekday)]
    }

    /// Frequency of `word`, zero when it never passed the filters.
    pub fn frequency_of(&self, word: &str) -> u64 {
        self.word_frequencies.get(word).copied().unwrap_or(0)
    }
}
