//! Main analysis pipeline for msgstats.
//!
//! Loads an archive through a [`MessageSource`], runs the
//! [`MessageAnalyzer`] over it and returns the statistics together with run
//! metadata, ready for the presentation layer.

use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use msgstats_core::error::Result;
use msgstats_core::models::AnalysisResult;
use tracing::info;

use crate::aggregator::MessageAnalyzer;
use crate::reader::MessageSource;

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// Archive the messages were read from.
    pub source_path: String,
    /// Number of messages aggregated.
    pub messages_processed: usize,
    /// IANA name of the zone used for bucketing.
    pub timezone: String,
    /// Wall-clock seconds spent reading and parsing the archive.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent aggregating.
    pub aggregate_time_seconds: f64,
}

/// The complete output of [`analyze_archive`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ArchiveAnalysis {
    pub result: AnalysisResult,
    pub metadata: AnalysisMetadata,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full analysis pipeline.
///
/// 1. Load the messages of `path` from `source` (cached sources return the
///    previously parsed document).
/// 2. Aggregate them with `analyzer`, ranking `top_k` words.
/// 3. Return the result with timing metadata.
pub fn analyze_archive<S>(
    source: &mut S,
    path: &Path,
    analyzer: &MessageAnalyzer,
    top_k: usize,
) -> Result<ArchiveAnalysis>
where
    S: MessageSource + ?Sized,
{
    // ── Step 1: Load messages ─────────────────────────────────────────────────
    info!("Reading file {}", path.display());
    let load_start = Instant::now();
    let messages = source.load(path)?;
    let load_time = load_start.elapsed().as_secs_f64();
    info!("Loaded {} messages in {:.3} seconds", messages.len(), load_time);

    // ── Step 2: Aggregate ─────────────────────────────────────────────────────
    let aggregate_start = Instant::now();
    let result = analyzer.analyze(&messages, top_k)?;
    let aggregate_time = aggregate_start.elapsed().as_secs_f64();
    info!("Processed data in {:.3} seconds", aggregate_time);

    // ── Step 3: Build result ──────────────────────────────────────────────────
    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        source_path: path.display().to_string(),
        messages_processed: result.message_count,
        timezone: analyzer.timezone().name().to_string(),
        load_time_seconds: load_time,
        aggregate_time_seconds: aggregate_time,
    };

    Ok(ArchiveAnalysis { result, metadata })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
