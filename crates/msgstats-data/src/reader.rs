//! JSON archive loading for msgstats.
//!
//! Reads an exported chat archive (a JSON document with a top-level
//! `messages` array), validates every record and returns the messages
//! sorted by timestamp. [`JsonFileSource`] keeps an explicit
//! [`DocumentCache`] so repeated loads of the same path skip the disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use msgstats_core::error::{Result, StatsError};
use msgstats_core::models::Message;
use serde_json::{Map, Value};
use tracing::debug;

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse an archive document into messages sorted ascending by timestamp.
///
/// Messages sharing a timestamp keep their document order.
pub fn parse_messages(json: &str) -> Result<Vec<Message>> {
    let document: Value = serde_json::from_str(json)?;
    messages_from_value(&document)
}

/// Same as [`parse_messages`] for an already-decoded document.
pub fn messages_from_value(document: &Value) -> Result<Vec<Message>> {
    let records = document
        .get("messages")
        .ok_or_else(|| StatsError::malformed("document has no `messages` field"))?
        .as_array()
        .ok_or_else(|| StatsError::malformed("`messages` is not an array"))?;

    let mut messages = records
        .iter()
        .enumerate()
        .map(|(index, record)| parse_record(index, record))
        .collect::<Result<Vec<_>>>()?;

    // `sort_by_key` is stable, which keeps ties in document order.
    messages.sort_by_key(|m| m.timestamp);
    Ok(messages)
}

fn parse_record(index: usize, record: &Value) -> Result<Message> {
    let object: &Map<String, Value> = record
        .as_object()
        .ok_or_else(|| StatsError::malformed(format!("message {} is not an object", index)))?;

    let raw_timestamp = object
        .get("timestamp")
        .ok_or_else(|| StatsError::malformed(format!("message {} has no timestamp", index)))?;
    let timestamp = parse_timestamp(raw_timestamp).ok_or_else(|| {
        StatsError::malformed(format!(
            "message {} has an invalid timestamp: {}",
            index, raw_timestamp
        ))
    })?;

    let content = match object.get("content") {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(other) => {
            return Err(StatsError::malformed(format!(
                "message {} has non-text content: {}",
                index, other
            )))
        }
    };

    Ok(Message {
        timestamp,
        content,
        // Presence alone marks a sticker; the payload is irrelevant.
        has_sticker: object.contains_key("sticker"),
    })
}

/// Accept integral epoch seconds, or finite fractional seconds (floored).
fn parse_timestamp(value: &Value) -> Option<i64> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(secs) = number.as_i64() {
        return Some(secs);
    }
    let secs = number.as_f64()?.floor();
    if secs.is_finite() && secs >= i64::MIN as f64 && secs < i64::MAX as f64 {
        Some(secs as i64)
    } else {
        None
    }
}

// ── MessageSource ─────────────────────────────────────────────────────────────

/// Anything that can produce the ordered messages of an archive.
pub trait MessageSource {
    /// Load the messages stored at `path`, sorted ascending by timestamp.
    fn load(&mut self, path: &Path) -> Result<Arc<[Message]>>;
}

// ── DocumentCache ─────────────────────────────────────────────────────────────

/// Loaded archives keyed by path.
///
/// Entries are immutable `Arc<[Message]>` slices, so handing one out can
/// never let a caller change what a later load returns.
#[derive(Debug, Default)]
pub struct DocumentCache {
    entries: HashMap<PathBuf, Arc<[Message]>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<Arc<[Message]>> {
        self.entries.get(path).cloned()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, messages: Arc<[Message]>) {
        self.entries.insert(path.into(), messages);
    }

    /// Drop the entry for `path`. Returns `true` when one existed.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        let removed = self.entries.remove(path).is_some();
        if removed {
            debug!(path = %path.display(), "cache entry invalidated");
        }
        removed
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        debug!("cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── JsonFileSource ────────────────────────────────────────────────────────────

/// Reads archives from disk, caching each parsed document by path.
#[derive(Debug, Default)]
pub struct JsonFileSource {
    cache: DocumentCache,
}

impl JsonFileSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing cache, e.g. one shared across several runs in a test.
    pub fn with_cache(cache: DocumentCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut DocumentCache {
        &mut self.cache
    }

    /// Give back the cache, ending this source's lifetime.
    pub fn into_cache(self) -> DocumentCache {
        self.cache
    }
}

impl MessageSource for JsonFileSource {
    fn load(&mut self, path: &Path) -> Result<Arc<[Message]>> {
        if let Some(messages) = self.cache.get(path) {
            debug!(path = %path.display(), "returning cached archive");
            return Ok(messages);
        }

        let json = std::fs::read_to_string(path).map_err(|source| StatsError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let messages: Arc<[Message]> = parse_messages(&json)?.into();

        debug!(
            path = %path.display(),
            messages = messages.len(),
            "archive loaded and cached"
        );
        self.cache.insert(path, Arc::clone(&messages));
        Ok(messages)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
