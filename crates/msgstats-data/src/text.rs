//! Text normalization, tokenization and stop-word filtering.
//!
//! Message text is folded to plain ASCII, split into raw tokens, lowercased
//! and stripped of surrounding punctuation before it is counted.

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use deunicode::deunicode_char;
use msgstats_core::error::{Result, StatsError};
use unicode_normalization::UnicodeNormalization;

/// The NLTK English stop-word list.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

// ── Normalization ─────────────────────────────────────────────────────────────

/// Fold `text` to plain ASCII.
///
/// Composes the text (NFC) so decomposed accents reach the lookup as one
/// letter, then replaces every non-ASCII scalar with its `deunicode`
/// transliteration: `"straße"` becomes `"strasse"`, `"don’t"` becomes
/// `"don't"` and Cyrillic is romanised. Emoji and other pictographs
/// disappear entirely.
pub fn transliterate(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    for c in text.nfc() {
        if c.is_ascii() {
            out.push(c);
        } else if !is_pictograph(c) {
            out.push_str(deunicode_char(c).unwrap_or(""));
        }
    }
    out
}

/// Emoji, dingbats, skin-tone modifiers and the joiners that glue them.
fn is_pictograph(c: char) -> bool {
    matches!(
        c,
        '\u{200D}'
            | '\u{2600}'..='\u{27BF}'
            | '\u{2B00}'..='\u{2BFF}'
            | '\u{FE00}'..='\u{FE0F}'
            | '\u{1F000}'..='\u{1FAFF}'
            | '\u{E0020}'..='\u{E007F}'
    )
}

/// Lowercase `raw` and strip leading/trailing ASCII punctuation.
///
/// A token made only of punctuation is kept as its lowercased self rather
/// than collapsing to an empty string.
pub fn normalize_token(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let stripped = lower.trim_matches(|c: char| c.is_ascii_punctuation());
    if stripped.is_empty() {
        lower
    } else {
        stripped.to_string()
    }
}

// ── SplitMode ─────────────────────────────────────────────────────────────────

/// How normalized text is cut into raw tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SplitMode {
    /// Split on every single `' '`; consecutive spaces yield empty tokens
    /// and other whitespace stays inside tokens.
    #[default]
    Space,
    /// Split on runs of any Unicode whitespace.
    Whitespace,
}

impl FromStr for SplitMode {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "space" => Ok(Self::Space),
            "whitespace" => Ok(Self::Whitespace),
            other => Err(StatsError::Config(format!("unknown split mode: {}", other))),
        }
    }
}

// ── StopWords ─────────────────────────────────────────────────────────────────

/// A set of words excluded from frequency counting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// The built-in English list.
    pub fn english() -> Self {
        Self::from_words(ENGLISH_STOP_WORDS.iter().copied())
    }

    /// A set that filters nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from arbitrary words; entries are lowercased.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Load a set from a file with one word per line.
    ///
    /// Blank lines and lines starting with `#` are ignored.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| StatsError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_words(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        ))
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

// ── Tokenizer ─────────────────────────────────────────────────────────────────

/// Turns normalized message text into countable words.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    split_mode: SplitMode,
    stop_words: StopWords,
}

impl Tokenizer {
    pub fn new(split_mode: SplitMode, stop_words: StopWords) -> Self {
        Self {
            split_mode,
            stop_words,
        }
    }

    pub fn split_mode(&self) -> SplitMode {
        self.split_mode
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    /// Words of `text` (already transliterated) that survive the length and
    /// stop-word filters, in order of appearance.
    pub fn words<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        let raw: Box<dyn Iterator<Item = &'a str> + 'a> = match self.split_mode {
            SplitMode::Space => Box::new(text.split(' ')),
            SplitMode::Whitespace => Box::new(text.split_whitespace()),
        };
        raw.map(normalize_token)
            .filter(move |word| word.chars().count() > 1 && !self.stop_words.contains(word))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
