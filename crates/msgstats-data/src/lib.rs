//! Data layer for msgstats.
//!
//! Responsible for reading and validating exported chat archives, turning
//! message text into countable words, scoring sentiment, aggregating
//! statistics and running the top-level analysis pipeline.

pub mod aggregator;
pub mod analysis;
pub mod reader;
pub mod sentiment;
pub mod text;

pub use msgstats_core as core;
