//! Sentiment scoring.
//!
//! The aggregation engine only needs something that maps text to a
//! [`SentimentScores`] tuple. [`LexiconScorer`] is the built-in
//! implementation: a rule-based scorer in the VADER style working from a
//! word-valence lexicon, with booster words, negation and capitalisation
//! emphasis.

use std::collections::HashMap;
use std::path::Path;

use msgstats_core::error::{Result, StatsError};
use msgstats_core::models::SentimentScores;

/// Anything that can score a piece of text.
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> SentimentScores;
}

// ── Constants ─────────────────────────────────────────────────────────────────

/// Valence added by a booster word ("very good").
const BOOSTER_INCREMENT: f64 = 0.293;
/// Valence removed by a dampener word ("slightly good").
const BOOSTER_DECREMENT: f64 = -0.293;
/// Extra valence for an ALL-CAPS sentiment word in mixed-case text.
const CAPS_INCREMENT: f64 = 0.733;
/// Multiplier applied to a word preceded by a negation.
const NEGATION_SCALAR: f64 = -0.74;
/// Extra valence per exclamation mark, up to [`MAX_EXCLAMATIONS`].
const EXCLAMATION_INCREMENT: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
/// Normalisation constant for the compound score.
const COMPOUND_ALPHA: f64 = 15.0;
/// How many preceding tokens can boost or negate a word.
const LOOKBACK: usize = 3;

/// Built-in `(word, valence)` pairs on a −4..+4 scale.
const BUILTIN_LEXICON: &[(&str, f64)] = &[
    ("adorable", 2.2), ("amazing", 2.8), ("awesome", 3.1), ("beautiful", 2.9),
    ("best", 3.2), ("better", 1.9), ("brilliant", 2.8), ("care", 2.2),
    ("cheerful", 2.5), ("congrats", 2.4), ("congratulations", 2.9), ("cool", 1.3),
    ("cute", 2.0), ("delight", 2.9), ("enjoy", 2.2), ("excellent", 2.7),
    ("excited", 1.4), ("fantastic", 2.6), ("fun", 2.3), ("funny", 1.9),
    ("glad", 2.0), ("good", 1.9), ("great", 3.1), ("haha", 2.0),
    ("hahaha", 2.6), ("happy", 2.7), ("hope", 1.9), ("hug", 2.1),
    ("hugs", 2.2), ("interesting", 1.7), ("joy", 2.8), ("kind", 2.4),
    ("kiss", 1.8), ("like", 2.0), ("lmao", 2.9), ("lol", 1.8),
    ("love", 3.2), ("loved", 2.9), ("lovely", 2.8), ("lucky", 1.9),
    ("miss", -0.6), ("nice", 1.8), ("ok", 1.2), ("okay", 0.9),
    ("perfect", 2.7), ("pleasant", 2.3), ("pretty", 2.2), ("proud", 2.1),
    ("smile", 1.5), ("sweet", 2.0), ("thank", 1.5), ("thanks", 1.9),
    ("win", 2.8), ("wonderful", 2.7), ("wow", 2.8), ("yay", 2.4),
    ("yes", 1.7), ("yum", 1.9),
    ("afraid", -2.2), ("angry", -2.3), ("annoyed", -1.6), ("annoying", -1.7),
    ("anxious", -1.0), ("ashamed", -2.1), ("awful", -2.0), ("bad", -2.5),
    ("boring", -1.3), ("broke", -1.8), ("cry", -2.1), ("crying", -2.1),
    ("damn", -1.7), ("dead", -3.3), ("depressed", -2.3), ("disappointed", -1.9),
    ("disgusting", -2.4), ("dislike", -1.6), ("dumb", -2.3), ("fail", -2.5),
    ("fear", -2.2), ("hate", -2.7), ("hated", -3.2), ("horrible", -2.5),
    ("hurt", -2.4), ("lonely", -1.5), ("lose", -1.7), ("lost", -1.3),
    ("mad", -2.2), ("mean", -1.2), ("no", -1.2), ("pain", -2.3),
    ("sad", -2.1), ("scared", -1.9), ("sick", -2.3), ("sorry", -0.3),
    ("stress", -1.8), ("stressed", -1.4), ("stupid", -2.4), ("terrible", -2.1),
    ("tired", -1.9), ("ugh", -1.8), ("ugly", -2.3), ("upset", -1.6),
    ("worried", -1.2), ("worse", -2.1), ("worst", -3.1), ("wrong", -2.1),
];

const BOOSTERS: &[&str] = &[
    "absolutely", "amazingly", "completely", "deeply", "especially", "extremely",
    "highly", "hugely", "incredibly", "really", "so", "super", "totally", "truly",
    "very",
];

const DAMPENERS: &[&str] = &[
    "barely", "hardly", "kinda", "kindof", "little", "marginally", "partly",
    "scarcely", "slightly", "somewhat", "sorta",
];

const NEGATIONS: &[&str] = &[
    "aint", "cannot", "cant", "didnt", "doesnt", "dont", "isnt", "neither", "never",
    "no", "nobody", "none", "nope", "nor", "not", "nothing", "nowhere", "wasnt",
    "without", "wont", "wouldnt",
];

// ── LexiconScorer ─────────────────────────────────────────────────────────────

/// Rule-based scorer driven by a word-valence lexicon.
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    lexicon: HashMap<String, f64>,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconScorer {
    /// Scorer using the built-in English lexicon.
    pub fn new() -> Self {
        Self::with_lexicon(
            BUILTIN_LEXICON
                .iter()
                .map(|(word, valence)| (word.to_string(), *valence)),
        )
    }

    /// Scorer using caller-supplied `(word, valence)` pairs.
    pub fn with_lexicon<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        Self {
            lexicon: entries
                .into_iter()
                .map(|(word, valence)| (word.to_lowercase(), valence))
                .collect(),
        }
    }

    /// Load a VADER-format lexicon: one `word<TAB>valence[<TAB>...]` entry
    /// per line. Blank lines are skipped.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| StatsError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_lexicon(&content)
    }

    /// Parse lexicon text in the format accepted by [`Self::load_from_file`].
    pub fn parse_lexicon(content: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split('\t');
            let word = fields.next().unwrap_or_default().trim();
            let valence = fields
                .next()
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    StatsError::Config(format!(
                        "lexicon line {}: expected `word<TAB>valence`",
                        number + 1
                    ))
                })?;
            if word.is_empty() {
                return Err(StatsError::Config(format!(
                    "lexicon line {}: empty word",
                    number + 1
                )));
            }
            entries.push((word.to_string(), valence));
        }
        Ok(Self::with_lexicon(entries))
    }

    pub fn len(&self) -> usize {
        self.lexicon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexicon.is_empty()
    }

    /// Valence of each token after booster, negation and emphasis rules.
    fn valences(&self, tokens: &[&str]) -> Vec<f64> {
        let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
        let mixed_case = is_mixed_case(tokens);

        let mut valences = Vec::with_capacity(tokens.len());
        for (i, word) in lowered.iter().enumerate() {
            let Some(&base) = self.lexicon.get(word.as_str()) else {
                valences.push(0.0);
                continue;
            };
            // Boosters carry no valence of their own.
            if is_booster(word).is_some() {
                valences.push(0.0);
                continue;
            }

            let mut valence = base;
            if mixed_case && is_all_caps(tokens[i]) {
                valence += CAPS_INCREMENT.copysign(base);
            }

            for distance in 1..=LOOKBACK.min(i) {
                let prior = lowered[i - distance].as_str();
                if let Some(scalar) = is_booster(prior) {
                    let damping = match distance {
                        1 => 1.0,
                        2 => 0.95,
                        _ => 0.9,
                    };
                    // Boosters push away from zero, dampeners towards it.
                    valence += scalar * base.signum() * damping;
                }
                if is_negation(prior) {
                    valence *= NEGATION_SCALAR;
                }
            }

            valences.push(valence);
        }
        valences
    }
}

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> SentimentScores {
        let tokens: Vec<&str> = text
            .split_whitespace()
            .map(strip_edges)
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            return SentimentScores::default();
        }

        let valences = self.valences(&tokens);
        let mut sum: f64 = valences.iter().sum();

        let exclamations = text.matches('!').count().min(MAX_EXCLAMATIONS);
        let emphasis = exclamations as f64 * EXCLAMATION_INCREMENT;
        if sum > 0.0 {
            sum += emphasis;
        } else if sum < 0.0 {
            sum -= emphasis;
        }

        let compound = (sum / (sum * sum + COMPOUND_ALPHA).sqrt()).clamp(-1.0, 1.0);

        let mut positive_sum = 0.0;
        let mut negative_sum = 0.0;
        let mut neutral_count = 0.0;
        for &v in &valences {
            if v > 0.0 {
                positive_sum += v + 1.0;
            } else if v < 0.0 {
                negative_sum += v - 1.0;
            } else {
                neutral_count += 1.0;
            }
        }
        if positive_sum > negative_sum.abs() {
            positive_sum += emphasis;
        } else if positive_sum < negative_sum.abs() {
            negative_sum -= emphasis;
        }

        let total = positive_sum + negative_sum.abs() + neutral_count;
        SentimentScores {
            positive: round_to(positive_sum / total, 3),
            neutral: round_to(neutral_count / total, 3),
            negative: round_to(negative_sum.abs() / total, 3),
            compound: round_to(compound, 4),
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn strip_edges(token: &str) -> &str {
    let stripped = token.trim_matches(|c: char| c.is_ascii_punctuation());
    // Keep short tokens such as ":)" intact.
    if stripped.len() <= 2 {
        token
    } else {
        stripped
    }
}

fn is_booster(word: &str) -> Option<f64> {
    if BOOSTERS.contains(&word) {
        Some(BOOSTER_INCREMENT)
    } else if DAMPENERS.contains(&word) {
        Some(BOOSTER_DECREMENT)
    } else {
        None
    }
}

fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word) || word.ends_with("n't")
}

fn is_all_caps(token: &str) -> bool {
    token.chars().any(char::is_alphabetic) && !token.chars().any(char::is_lowercase)
}

/// `true` when some but not all tokens are ALL-CAPS.
fn is_mixed_case(tokens: &[&str]) -> bool {
    let caps = tokens.iter().filter(|t| is_all_caps(t)).count();
    caps > 0 && caps < tokens.len()
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

// ── Tests ─────────────────────────────────────────────────────────────────────
