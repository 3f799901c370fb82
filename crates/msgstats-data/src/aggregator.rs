//! Single-pass message aggregation.
//!
//! [`MessageAnalyzer::analyze`] folds an ordered message slice into an
//! [`Accumulator`] (counts per bucket, sentiment sums, word tallies, span)
//! and then finalizes it into an immutable [`AnalysisResult`].

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap, HashMap};

use chrono::{Datelike, NaiveDate, Timelike};
use msgstats_core::error::{Result, StatsError};
use msgstats_core::models::{weekday_slot, AnalysisResult, Message, MessageSpan, WordCount};
use msgstats_core::time_utils::TimezoneHandler;
use tracing::debug;

use crate::sentiment::{LexiconScorer, SentimentScorer};
use crate::text::{transliterate, SplitMode, StopWords, Tokenizer};

// ── SpanPolicy ────────────────────────────────────────────────────────────────

/// What to do when every message falls on one calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpanPolicy {
    /// Average over a single day.
    #[default]
    Clamp,
    /// Fail with [`StatsError::InsufficientSpan`].
    Reject,
}

// ── Accumulator state ─────────────────────────────────────────────────────────

/// Position of a token in the traversal: `(message index, token index)`.
type Position = (usize, usize);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct DayTally {
    messages: u64,
    stickers: u64,
    sentiment_sum: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct MonthTally {
    messages: u64,
    stickers: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WordTally {
    count: u64,
    first_seen: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SpanBounds {
    first_timestamp: i64,
    first_date: NaiveDate,
    last_timestamp: i64,
    last_date: NaiveDate,
}

impl SpanBounds {
    fn single(timestamp: i64, date: NaiveDate) -> Self {
        Self {
            first_timestamp: timestamp,
            first_date: date,
            last_timestamp: timestamp,
            last_date: date,
        }
    }

    fn union(self, other: Self) -> Self {
        let (first_timestamp, first_date) = if other.first_timestamp < self.first_timestamp {
            (other.first_timestamp, other.first_date)
        } else {
            (self.first_timestamp, self.first_date)
        };
        let (last_timestamp, last_date) = if other.last_timestamp > self.last_timestamp {
            (other.last_timestamp, other.last_date)
        } else {
            (self.last_timestamp, self.last_date)
        };
        Self {
            first_timestamp,
            first_date,
            last_timestamp,
            last_date,
        }
    }
}

/// Running state of one aggregation.
///
/// Normally private to a single [`MessageAnalyzer::analyze`] call. It is
/// exposed so that callers can fold disjoint shards separately and combine
/// them with [`Accumulator::merge`]; counts and sentiment sums add up, word
/// tallies add up keeping the earliest first-seen position, and the span is
/// the union of both spans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulator {
    messages: usize,
    days: BTreeMap<NaiveDate, DayTally>,
    months: BTreeMap<(i32, u32), MonthTally>,
    hourly: [u64; 24],
    weekday: [u64; 7],
    words: HashMap<String, WordTally>,
    span: Option<SpanBounds>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages folded so far.
    pub fn message_count(&self) -> usize {
        self.messages
    }

    /// Number of distinct words tallied so far.
    pub fn vocabulary_size(&self) -> usize {
        self.words.len()
    }

    /// Combine another accumulator into this one.
    pub fn merge(&mut self, other: Accumulator) {
        self.messages += other.messages;

        for (date, tally) in other.days {
            let day = self.days.entry(date).or_default();
            day.messages += tally.messages;
            day.stickers += tally.stickers;
            day.sentiment_sum += tally.sentiment_sum;
        }
        for (month, tally) in other.months {
            let entry = self.months.entry(month).or_default();
            entry.messages += tally.messages;
            entry.stickers += tally.stickers;
        }
        for (slot, count) in self.hourly.iter_mut().zip(other.hourly) {
            *slot += count;
        }
        for (slot, count) in self.weekday.iter_mut().zip(other.weekday) {
            *slot += count;
        }
        for (word, tally) in other.words {
            self.words
                .entry(word)
                .and_modify(|existing| {
                    existing.count += tally.count;
                    existing.first_seen = existing.first_seen.min(tally.first_seen);
                })
                .or_insert(tally);
        }
        self.span = match (self.span, other.span) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        };
    }
}

// ── MessageAnalyzer ───────────────────────────────────────────────────────────

/// The aggregation engine.
///
/// Holds the injected capabilities (time zone, sentiment scorer, tokenizer,
/// span policy); every call to [`MessageAnalyzer::analyze`] starts from a
/// fresh [`Accumulator`], so results never leak between calls.
pub struct MessageAnalyzer {
    timezone: TimezoneHandler,
    scorer: Box<dyn SentimentScorer>,
    tokenizer: Tokenizer,
    span_policy: SpanPolicy,
}

impl MessageAnalyzer {
    /// Engine for `timezone` with the lexicon scorer, English stop words,
    /// single-space splitting and the clamping span policy.
    pub fn new(timezone: TimezoneHandler) -> Self {
        Self {
            timezone,
            scorer: Box::new(LexiconScorer::new()),
            tokenizer: Tokenizer::new(SplitMode::default(), StopWords::english()),
            span_policy: SpanPolicy::default(),
        }
    }

    pub fn with_scorer(mut self, scorer: impl SentimentScorer + 'static) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    pub fn with_boxed_scorer(mut self, scorer: Box<dyn SentimentScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_stop_words(mut self, stop_words: StopWords) -> Self {
        self.tokenizer = Tokenizer::new(self.tokenizer.split_mode(), stop_words);
        self
    }

    pub fn with_split_mode(mut self, split_mode: SplitMode) -> Self {
        self.tokenizer = Tokenizer::new(split_mode, self.tokenizer.stop_words().clone());
        self
    }

    pub fn with_span_policy(mut self, span_policy: SpanPolicy) -> Self {
        self.span_policy = span_policy;
        self
    }

    pub fn timezone(&self) -> &TimezoneHandler {
        &self.timezone
    }

    /// Aggregate `messages` and rank the `top_k` most frequent words.
    ///
    /// Fails with [`StatsError::EmptyInput`] for an empty slice,
    /// [`StatsError::Config`] when `top_k` is zero and
    /// [`StatsError::InsufficientSpan`] for a single-day archive under
    /// [`SpanPolicy::Reject`].
    pub fn analyze(&self, messages: &[Message], top_k: usize) -> Result<AnalysisResult> {
        if top_k == 0 {
            return Err(StatsError::Config("top_k must be at least 1".to_string()));
        }
        if messages.is_empty() {
            return Err(StatsError::EmptyInput);
        }

        let mut acc = Accumulator::new();
        self.accumulate(&mut acc, 0, messages)?;
        self.finalize(acc, top_k)
    }

    /// Fold `messages` into `acc`.
    ///
    /// `offset` is the global index of `messages[0]`; it orders word
    /// first-seen positions across shards.
    pub fn accumulate(
        &self,
        acc: &mut Accumulator,
        offset: usize,
        messages: &[Message],
    ) -> Result<()> {
        for (i, message) in messages.iter().enumerate() {
            self.accumulate_one(acc, offset + i, message)?;
        }
        Ok(())
    }

    fn accumulate_one(&self, acc: &mut Accumulator, index: usize, message: &Message) -> Result<()> {
        let local = self.timezone.localize(message.timestamp)?;
        let date = local.date_naive();

        acc.messages += 1;
        acc.hourly[local.hour() as usize] += 1;
        acc.weekday[weekday_slot(local.weekday())] += 1;

        let day = acc.days.entry(date).or_default();
        day.messages += 1;
        let month = acc.months.entry((date.year(), date.month())).or_default();
        month.messages += 1;
        if message.has_sticker {
            day.stickers += 1;
            month.stickers += 1;
        }

        if let Some(content) = message.non_empty_content() {
            let text = transliterate(content);
            day.sentiment_sum += self.scorer.score(&text).net();

            for (token_index, word) in self.tokenizer.words(&text).enumerate() {
                let position = (index, token_index);
                acc.words
                    .entry(word)
                    .and_modify(|tally| tally.count += 1)
                    .or_insert(WordTally {
                        count: 1,
                        first_seen: position,
                    });
            }
        }

        let bounds = SpanBounds::single(message.timestamp, date);
        acc.span = Some(match acc.span {
            Some(existing) => existing.union(bounds),
            None => bounds,
        });
        Ok(())
    }

    /// Turn a filled accumulator into the final result.
    pub fn finalize(&self, acc: Accumulator, top_k: usize) -> Result<AnalysisResult> {
        if top_k == 0 {
            return Err(StatsError::Config("top_k must be at least 1".to_string()));
        }
        let bounds = acc.span.ok_or(StatsError::EmptyInput)?;

        let num_days = (bounds.last_date - bounds.first_date).num_days();
        let divisor = match (num_days, self.span_policy) {
            (0, SpanPolicy::Reject) => {
                return Err(StatsError::InsufficientSpan {
                    date: bounds.first_date,
                })
            }
            (0, SpanPolicy::Clamp) => 1,
            (days, _) => days,
        };

        let mut daily_counts = BTreeMap::new();
        let mut daily_sticker_counts = BTreeMap::new();
        let mut daily_sentiment = BTreeMap::new();
        for (date, tally) in &acc.days {
            let key = date.format("%Y-%m-%d").to_string();
            if tally.stickers > 0 {
                daily_sticker_counts.insert(key.clone(), tally.stickers);
            }
            daily_sentiment.insert(key.clone(), tally.sentiment_sum / tally.messages as f64);
            daily_counts.insert(key, tally.messages);
        }

        let mut monthly_counts = BTreeMap::new();
        let mut monthly_sticker_counts = BTreeMap::new();
        for (&(year, month), tally) in &acc.months {
            let key = format!("{:04}-{:02}", year, month);
            if tally.stickers > 0 {
                monthly_sticker_counts.insert(key.clone(), tally.stickers);
            }
            monthly_counts.insert(key, tally.messages);
        }

        let days = divisor as f64;
        let weekday_averages = acc.weekday.map(|count| count as f64 / days * 7.0);
        let hourly_averages = acc.hourly.map(|count| count as f64 / days);

        let top_words = select_top_k(&acc.words, top_k);
        let word_frequencies: BTreeMap<String, u64> = acc
            .words
            .into_iter()
            .map(|(word, tally)| (word, tally.count))
            .collect();

        debug!(
            messages = acc.messages,
            days = daily_counts.len(),
            vocabulary = word_frequencies.len(),
            num_days,
            "aggregation finalized"
        );

        Ok(AnalysisResult {
            message_count: acc.messages,
            daily_counts,
            daily_sticker_counts,
            monthly_counts,
            monthly_sticker_counts,
            hourly_counts: acc.hourly,
            weekday_counts: acc.weekday,
            daily_sentiment,
            word_frequencies,
            top_words,
            span: MessageSpan {
                first_date: bounds.first_date,
                last_date: bounds.last_date,
                first_timestamp: bounds.first_timestamp,
                last_timestamp: bounds.last_timestamp,
                num_days,
            },
            average_divisor_days: divisor,
            weekday_averages,
            hourly_averages,
        })
    }
}

// ── Top-K selection ───────────────────────────────────────────────────────────

/// A vocabulary entry ordered by rank: higher count first, then earlier
/// first-seen position first.
struct Ranked<'a> {
    word: &'a str,
    count: u64,
    first_seen: Position,
}

impl Ord for Ranked<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Greater means better ranked.
        self.count
            .cmp(&other.count)
            .then_with(|| other.first_seen.cmp(&self.first_seen))
    }
}

impl PartialOrd for Ranked<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ranked<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked<'_> {}

/// Pick the `k` best-ranked words with a bounded min-heap, then order only
/// those `k`.
fn select_top_k(words: &HashMap<String, WordTally>, k: usize) -> Vec<WordCount> {
    // `k` comes straight from the caller and may dwarf the vocabulary.
    let k = k.min(words.len());
    let mut heap: BinaryHeap<Reverse<Ranked<'_>>> = BinaryHeap::with_capacity(k);
    for (word, tally) in words {
        let candidate = Ranked {
            word,
            count: tally.count,
            first_seen: tally.first_seen,
        };
        if heap.len() < k {
            heap.push(Reverse(candidate));
        } else if heap.peek().is_some_and(|Reverse(worst)| candidate > *worst) {
            heap.pop();
            heap.push(Reverse(candidate));
        }
    }

    // Ascending order of `Reverse` is descending rank.
    heap.into_sorted_vec()
        .into_iter()
        .map(|Reverse(ranked)| WordCount {
            word: ranked.word.to_string(),
            count: ranked.count,
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use msgstats_core::models::SentimentScores;

    /// Deterministic scorer: each "good" adds 0.25 positive, each "bad"
    /// adds 0.25 negative, capped at 1.0.
    struct KeywordScorer;

    impl SentimentScorer for KeywordScorer {
        fn score(&self, text: &str) -> SentimentScores {
            let lower = text.to_lowercase();
            let positive = (lower.matches("good").count() as f64 * 0.25).min(1.0);
            let negative = (lower.matches("bad").count() as f64 * 0.25).min(1.0);
            SentimentScores {
                positive,
                neutral: (1.0 - positive - negative).max(0.0),
                negative,
                compound: positive - negative,
            }
        }
    }

    fn utc_analyzer() -> MessageAnalyzer {
        MessageAnalyzer::new(TimezoneHandler::default())
            .with_scorer(KeywordScorer)
            .with_stop_words(StopWords::empty())
    }

    const DAY: i64 = 86_400;

    /// 2017-03-05 12:00:00 UTC, a Sunday.
    const SUNDAY_NOON: i64 = 1_488_715_200;

    fn scenario_messages() -> Vec<Message> {
        vec![
            Message::text(1000, "Hi there!"),
            Message::text(1000, "Hi there!"),
            Message::sticker(87_400),
        ]
    }

    // ── Reference scenario ────────────────────────────────────────────────────

    #[test]
    fn test_scenario_day_and_sticker_counts() {
        let result = utc_analyzer().analyze(&scenario_messages(), 42).unwrap();

        assert_eq!(result.message_count, 3);
        assert_eq!(result.daily_counts.len(), 2);
        assert_eq!(result.daily_counts["1970-01-01"], 2);
        assert_eq!(result.daily_counts["1970-01-02"], 1);
        assert_eq!(result.daily_sticker_counts.len(), 1);
        assert_eq!(result.stickers_on("1970-01-02"), 1);
        assert_eq!(result.monthly_counts["1970-01"], 3);
        assert_eq!(result.stickers_in("1970-01"), 1);
    }

    #[test]
    fn test_scenario_word_frequencies() {
        let result = utc_analyzer().analyze(&scenario_messages(), 42).unwrap();

        assert_eq!(result.word_frequencies.len(), 2);
        assert_eq!(result.frequency_of("hi"), 2);
        assert_eq!(result.frequency_of("there"), 2);
        assert_eq!(
            result.top_words,
            vec![
                WordCount { word: "hi".to_string(), count: 2 },
                WordCount { word: "there".to_string(), count: 2 },
            ]
        );
    }

    #[test]
    fn test_scenario_span_and_averages() {
        let result = utc_analyzer().analyze(&scenario_messages(), 42).unwrap();

        assert_eq!(result.span.first_date, NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
        assert_eq!(result.span.last_date, NaiveDate::from_ymd_opt(1970, 1, 2).unwrap());
        assert_eq!(result.span.first_timestamp, 1000);
        assert_eq!(result.span.last_timestamp, 87_400);
        assert_eq!(result.span.num_days, 1);
        assert_eq!(result.average_divisor_days, 1);

        // 1970-01-01 was a Thursday; all three messages were sent at 00:16.
        assert_eq!(result.weekday_count(chrono::Weekday::Thu), 2);
        assert_eq!(result.weekday_count(chrono::Weekday::Fri), 1);
        assert_eq!(result.hourly_counts[0], 3);
        assert_eq!(result.weekday_averages[weekday_slot(chrono::Weekday::Thu)], 14.0);
        assert_eq!(result.hourly_averages[0], 3.0);
    }

    #[test]
    fn test_scenario_depends_on_timezone() {
        // In Tokyo (UTC+9) all three messages land on local days 1970-01-01
        // and 1970-01-02 at 09:16.
        let tokyo = MessageAnalyzer::new(TimezoneHandler::new("Asia/Tokyo"))
            .with_scorer(KeywordScorer)
            .with_stop_words(StopWords::empty());
        let result = tokyo.analyze(&scenario_messages(), 42).unwrap();
        assert_eq!(result.hourly_counts[9], 3);

        // In Honolulu (UTC-10) the first two fall on 1969-12-31.
        let honolulu = MessageAnalyzer::new(TimezoneHandler::new("Pacific/Honolulu"))
            .with_scorer(KeywordScorer)
            .with_stop_words(StopWords::empty());
        let result = honolulu.analyze(&scenario_messages(), 42).unwrap();
        assert_eq!(result.daily_counts["1969-12-31"], 2);
        assert_eq!(result.monthly_counts["1969-12"], 2);
        assert_eq!(result.monthly_counts["1970-01"], 1);
    }

    // ── Counting properties ───────────────────────────────────────────────────

    fn mixed_messages() -> Vec<Message> {
        (0..200)
            .map(|i| {
                let ts = SUNDAY_NOON + i * 7_919 * 13;
                match i % 5 {
                    0 => Message::sticker(ts),
                    1 => Message::text(ts, ""),
                    2 => Message::text(ts, "good morning, good people"),
                    3 => Message::text(ts, "bad traffic again!!"),
                    _ => Message {
                        timestamp: ts,
                        content: None,
                        has_sticker: false,
                    },
                }
            })
            .collect()
    }

    #[test]
    fn test_count_conservation() {
        let messages = mixed_messages();
        let result = utc_analyzer().analyze(&messages, 10).unwrap();

        let day_total: u64 = result.daily_counts.values().sum();
        let month_total: u64 = result.monthly_counts.values().sum();
        let hour_total: u64 = result.hourly_counts.iter().sum();
        let weekday_total: u64 = result.weekday_counts.iter().sum();

        assert_eq!(day_total, messages.len() as u64);
        assert_eq!(month_total, messages.len() as u64);
        assert_eq!(hour_total, messages.len() as u64);
        assert_eq!(weekday_total, messages.len() as u64);
        assert_eq!(result.total_stickers(), 40);
    }

    #[test]
    fn test_idempotent() {
        let messages = mixed_messages();
        let analyzer = utc_analyzer();
        let first = analyzer.analyze(&messages, 10).unwrap();
        let second = analyzer.analyze(&messages, 10).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_span_covers_every_message() {
        let messages = mixed_messages();
        let handler = TimezoneHandler::default();
        let result = utc_analyzer().analyze(&messages, 10).unwrap();

        for message in &messages {
            let date = handler.localize(message.timestamp).unwrap().date_naive();
            assert!(result.span.contains(date));
        }
        assert_eq!(
            result.span.num_days,
            (result.span.last_date - result.span.first_date).num_days()
        );
    }

    #[test]
    fn test_span_tracks_min_max_on_unsorted_input() {
        let messages = vec![
            Message::text(SUNDAY_NOON + 3 * DAY, "later"),
            Message::text(SUNDAY_NOON, "earliest"),
            Message::text(SUNDAY_NOON + 10 * DAY, "latest"),
        ];
        let result = utc_analyzer().analyze(&messages, 5).unwrap();
        assert_eq!(result.span.first_timestamp, SUNDAY_NOON);
        assert_eq!(result.span.last_timestamp, SUNDAY_NOON + 10 * DAY);
        assert_eq!(result.span.num_days, 10);
    }

    #[test]
    fn test_num_days_counts_calendar_days() {
        // 23:30 on Sunday and 00:30 on Monday are an hour apart but one
        // calendar day apart.
        let late = SUNDAY_NOON + 11 * 3_600 + 1_800;
        let messages = vec![Message::text(late, "night"), Message::text(late + 3_600, "morning")];
        let result = utc_analyzer().analyze(&messages, 5).unwrap();
        assert_eq!(result.span.num_days, 1);
    }

    #[test]
    fn test_per_week_and_per_day_averages() {
        // Two weeks of one message per day at 08:00, plus 14 extra on Sundays.
        let eight_am = SUNDAY_NOON - 4 * 3_600;
        let mut messages: Vec<Message> =
            (0..=14).map(|d| Message::text(eight_am + d * DAY, "hello")).collect();
        messages.push(Message::text(eight_am + 7 * DAY + 60, "sunday extra"));

        let result = utc_analyzer().analyze(&messages, 5).unwrap();
        assert_eq!(result.span.num_days, 14);
        assert_eq!(result.average_divisor_days, 14);

        // Sundays: days 0, 7 and 14 plus the extra = 4 messages.
        let sunday = result.weekday_averages[weekday_slot(chrono::Weekday::Sun)];
        assert!((sunday - 4.0 / 14.0 * 7.0).abs() < 1e-12);
        let monday = result.weekday_averages[weekday_slot(chrono::Weekday::Mon)];
        assert!((monday - 2.0 / 14.0 * 7.0).abs() < 1e-12);
        assert!((result.hourly_averages[8] - 16.0 / 14.0).abs() < 1e-12);
        assert_eq!(result.hourly_averages[9], 0.0);
    }

    // ── Sentiment ─────────────────────────────────────────────────────────────

    #[test]
    fn test_daily_sentiment_divides_by_all_messages_of_the_day() {
        let messages = vec![
            Message::text(SUNDAY_NOON, "good"),
            Message::text(SUNDAY_NOON + 1, "good good"),
            Message::sticker(SUNDAY_NOON + 2),
            Message::text(SUNDAY_NOON + 3, ""),
            Message::text(SUNDAY_NOON + DAY, "bad"),
        ];
        let result = utc_analyzer().analyze(&messages, 5).unwrap();

        // (0.25 + 0.5 + 0 + 0) / 4
        assert_eq!(result.daily_sentiment["2017-03-05"], 0.1875);
        assert_eq!(result.daily_sentiment["2017-03-06"], -0.25);
        assert_eq!(result.daily_sentiment.len(), result.daily_counts.len());
    }

    #[test]
    fn test_day_without_content_has_zero_sentiment() {
        let messages = vec![Message::sticker(SUNDAY_NOON), Message::sticker(SUNDAY_NOON + DAY)];
        let result = utc_analyzer().analyze(&messages, 5).unwrap();
        assert!(result.daily_sentiment.values().all(|&v| v == 0.0));
        assert!(result.word_frequencies.is_empty());
        assert!(result.top_words.is_empty());
    }

    #[test]
    fn test_sentiment_bound_with_lexicon_scorer() {
        let texts = [
            "I LOVE this so much!!!",
            "worst day ever, I hate it",
            "meeting moved to 3pm",
            "not bad, not bad at all",
            "",
        ];
        let messages: Vec<Message> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| Message::text(SUNDAY_NOON + i as i64 * 40_000, *t))
            .collect();

        let analyzer = MessageAnalyzer::new(TimezoneHandler::default());
        let result = analyzer.analyze(&messages, 5).unwrap();
        for (day, value) in &result.daily_sentiment {
            assert!((-1.0..=1.0).contains(value), "{day}: {value}");
        }
    }

    #[test]
    fn test_scorer_sees_transliterated_text() {
        struct ExpectAscii;
        impl SentimentScorer for ExpectAscii {
            fn score(&self, text: &str) -> SentimentScores {
                assert!(text.is_ascii(), "scorer received {text:?}");
                SentimentScores::default()
            }
        }
        let analyzer = MessageAnalyzer::new(TimezoneHandler::default()).with_scorer(ExpectAscii);
        analyzer
            .analyze(&[Message::text(SUNDAY_NOON, "très bien 🎉")], 5)
            .unwrap();
    }

    // ── Word frequency ────────────────────────────────────────────────────────

    #[test]
    fn test_empty_content_contributes_no_words() {
        let messages = vec![Message::text(SUNDAY_NOON, ""), Message::text(SUNDAY_NOON + DAY, "")];
        let result = utc_analyzer().analyze(&messages, 5).unwrap();
        assert!(result.word_frequencies.is_empty());
        assert_eq!(result.daily_sentiment["2017-03-05"], 0.0);
    }

    #[test]
    fn test_all_punctuation_token_is_kept() {
        let messages = vec![Message::text(SUNDAY_NOON, "!!! ! ?? OK!")];
        let result = utc_analyzer().analyze(&messages, 5).unwrap();
        assert_eq!(result.frequency_of("!!!"), 1);
        assert_eq!(result.frequency_of("??"), 1);
        assert_eq!(result.frequency_of("ok"), 1);
        assert_eq!(result.frequency_of("!"), 0);
    }

    #[test]
    fn test_accents_are_folded_before_counting() {
        let messages = vec![Message::text(SUNDAY_NOON, "Café café CAFÉ cafe")];
        let result = utc_analyzer().analyze(&messages, 5).unwrap();
        assert_eq!(result.frequency_of("cafe"), 4);
        assert_eq!(result.word_frequencies.len(), 1);
    }

    #[test]
    fn test_typographic_text_counts_like_ascii() {
        let analyzer = MessageAnalyzer::new(TimezoneHandler::default()).with_scorer(KeywordScorer);
        let messages = vec![Message::text(SUNDAY_NOON, "don\u{2019}t straße well\u{2013}known")];
        let result = analyzer.analyze(&messages, 5).unwrap();

        assert_eq!(result.frequency_of("strasse"), 1);
        assert_eq!(result.frequency_of("well-known"), 1);
        assert_eq!(result.frequency_of("dont"), 0);
        assert_eq!(result.frequency_of("don't"), 0);
        assert_eq!(result.word_frequencies.len(), 2);
    }

    #[test]
    fn test_default_stop_words_apply() {
        let analyzer = MessageAnalyzer::new(TimezoneHandler::default()).with_scorer(KeywordScorer);
        let result = analyzer
            .analyze(&[Message::text(SUNDAY_NOON, "Hi there! The pizza is here")], 5)
            .unwrap();
        assert_eq!(result.frequency_of("hi"), 1);
        assert_eq!(result.frequency_of("pizza"), 1);
        assert_eq!(result.frequency_of("there"), 0);
        assert_eq!(result.frequency_of("the"), 0);
    }

    #[test]
    fn test_split_mode_changes_tokenization() {
        let messages = vec![Message::text(SUNDAY_NOON, "see\nyou  soon")];

        let space = utc_analyzer().analyze(&messages, 5).unwrap();
        assert_eq!(space.frequency_of("see\nyou"), 1);
        assert_eq!(space.frequency_of("soon"), 1);

        let whitespace = utc_analyzer()
            .with_split_mode(SplitMode::Whitespace)
            .analyze(&messages, 5)
            .unwrap();
        assert_eq!(whitespace.frequency_of("see"), 1);
        assert_eq!(whitespace.frequency_of("you"), 1);
        assert_eq!(whitespace.frequency_of("see\nyou"), 0);
    }

    // ── Top-K ─────────────────────────────────────────────────────────────────

    fn top_words(result: &AnalysisResult) -> Vec<(&str, u64)> {
        result
            .top_words
            .iter()
            .map(|w| (w.word.as_str(), w.count))
            .collect()
    }

    #[test]
    fn test_top_k_ties_resolve_first_encountered_first() {
        let messages = vec![
            Message::text(SUNDAY_NOON, "zebra apple"),
            Message::text(SUNDAY_NOON + 1, "mango apple zebra"),
            Message::text(SUNDAY_NOON + 2, "kiwi mango"),
        ];
        let result = utc_analyzer().analyze(&messages, 3).unwrap();
        assert_eq!(top_words(&result), vec![("zebra", 2), ("apple", 2), ("mango", 2)]);

        let result = utc_analyzer().analyze(&messages, 2).unwrap();
        assert_eq!(top_words(&result), vec![("zebra", 2), ("apple", 2)]);
    }

    #[test]
    fn test_top_k_larger_than_vocabulary() {
        let messages = vec![Message::text(SUNDAY_NOON, "one two two")];
        let result = utc_analyzer().analyze(&messages, 100).unwrap();
        assert_eq!(top_words(&result), vec![("two", 2), ("one", 1)]);
    }

    #[test]
    fn test_top_k_at_integer_limits() {
        let messages = vec![Message::text(SUNDAY_NOON, "hello world world")];
        for k in [u32::MAX as usize, usize::MAX] {
            let result = utc_analyzer().analyze(&messages, k).unwrap();
            assert_eq!(top_words(&result), vec![("world", 2), ("hello", 1)], "k = {k}");
        }
    }

    #[test]
    fn test_top_k_matches_brute_force() {
        // Pseudo-random vocabulary from a fixed linear congruential sequence.
        let vocabulary: Vec<String> = (0..60).map(|i| format!("w{:02}", i)).collect();
        let mut state: u64 = 0x2545_f491;
        let mut messages = Vec::new();
        for m in 0..300 {
            let mut words = Vec::new();
            for _ in 0..6 {
                state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
                // Skew towards low indices so that counts differ and tie.
                let pick = ((state >> 33) % 60) * ((state >> 20) % 60) / 60;
                words.push(vocabulary[pick as usize].clone());
            }
            messages.push(Message::text(SUNDAY_NOON + m * 600, words.join(" ")));
        }

        // Brute force: full count with first-seen order, full sort.
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, u64> = HashMap::new();
        for message in &messages {
            for word in message.content.as_deref().unwrap().split(' ') {
                if !counts.contains_key(word) {
                    order.push(word.to_string());
                }
                *counts.entry(word.to_string()).or_default() += 1;
            }
        }
        let mut expected: Vec<(String, u64)> =
            order.iter().map(|w| (w.clone(), counts[w])).collect();
        // Stable sort keeps first-seen order among equal counts.
        expected.sort_by(|a, b| b.1.cmp(&a.1));

        for k in [1, 5, 17, 42, 60, 80] {
            let result = utc_analyzer().analyze(&messages, k).unwrap();
            let got: Vec<(String, u64)> = result
                .top_words
                .iter()
                .map(|w| (w.word.clone(), w.count))
                .collect();
            let want: Vec<(String, u64)> = expected.iter().take(k).cloned().collect();
            assert_eq!(got, want, "k = {k}");
        }
    }

    // ── Errors ────────────────────────────────────────────────────────────────

    #[test]
    fn test_empty_input_is_an_error() {
        let err = utc_analyzer().analyze(&[], 42).unwrap_err();
        assert!(matches!(err, StatsError::EmptyInput));
    }

    #[test]
    fn test_zero_top_k_is_an_error() {
        let err = utc_analyzer().analyze(&scenario_messages(), 0).unwrap_err();
        assert!(matches!(err, StatsError::Config(_)));
    }

    #[test]
    fn test_single_day_clamps_by_default() {
        let messages = vec![
            Message::text(SUNDAY_NOON, "morning"),
            Message::text(SUNDAY_NOON + 3_600, "afternoon"),
        ];
        let result = utc_analyzer().analyze(&messages, 5).unwrap();
        assert_eq!(result.span.num_days, 0);
        assert_eq!(result.average_divisor_days, 1);
        assert_eq!(result.hourly_averages[12], 1.0);
        assert_eq!(result.weekday_averages[weekday_slot(chrono::Weekday::Sun)], 14.0);
    }

    #[test]
    fn test_single_day_rejected_under_strict_policy() {
        let messages = vec![Message::text(SUNDAY_NOON, "only today")];
        let err = utc_analyzer()
            .with_span_policy(SpanPolicy::Reject)
            .analyze(&messages, 5)
            .unwrap_err();
        match err {
            StatsError::InsufficientSpan { date } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2017, 3, 5).unwrap())
            }
            other => panic!("expected InsufficientSpan, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_timestamp_is_malformed() {
        let messages = vec![Message::text(i64::MAX, "far future")];
        let err = utc_analyzer().analyze(&messages, 5).unwrap_err();
        assert!(matches!(err, StatsError::MalformedInput(_)));
    }

    // ── Merging ───────────────────────────────────────────────────────────────

    #[test]
    fn test_sharded_merge_equals_single_pass() {
        let messages = mixed_messages();
        let analyzer = utc_analyzer();
        let whole = analyzer.analyze(&messages, 7).unwrap();

        // Fold three uneven shards, merging them out of order.
        let cuts = [0, 33, 120, messages.len()];
        let mut shards: Vec<Accumulator> = cuts
            .windows(2)
            .map(|w| {
                let mut acc = Accumulator::new();
                analyzer.accumulate(&mut acc, w[0], &messages[w[0]..w[1]]).unwrap();
                acc
            })
            .collect();

        let mut merged = shards.pop().unwrap();
        for shard in shards {
            merged.merge(shard);
        }
        assert_eq!(merged.message_count(), messages.len());

        let combined = analyzer.finalize(merged, 7).unwrap();
        assert_eq!(combined, whole);
    }

    #[test]
    fn test_merge_is_associative() {
        let messages = mixed_messages();
        let analyzer = utc_analyzer();
        let fold = |range: std::ops::Range<usize>| {
            let mut acc = Accumulator::new();
            analyzer.accumulate(&mut acc, range.start, &messages[range]).unwrap();
            acc
        };

        let mut left = fold(0..50);
        let mut bc = fold(50..90);
        bc.merge(fold(90..200));
        left.merge(bc);

        let mut ab = fold(0..50);
        ab.merge(fold(50..90));
        ab.merge(fold(90..200));

        assert_eq!(left, ab);
    }

    #[test]
    fn test_merge_with_empty_accumulator() {
        let messages = scenario_messages();
        let analyzer = utc_analyzer();
        let mut acc = Accumulator::new();
        analyzer.accumulate(&mut acc, 0, &messages).unwrap();
        let before = acc.clone();

        acc.merge(Accumulator::new());
        assert_eq!(acc, before);

        let mut empty = Accumulator::new();
        empty.merge(before.clone());
        assert_eq!(empty, before);
        assert_eq!(empty.vocabulary_size(), 2);
    }

    #[test]
    fn test_finalize_empty_accumulator_is_an_error() {
        let err = utc_analyzer().finalize(Accumulator::new(), 5).unwrap_err();
        assert!(matches!(err, StatsError::EmptyInput));
    }
}
