//! Shared building blocks for msgstats.
//!
//! Holds the message and result data model, the error taxonomy, time-zone
//! handling, command-line settings and number formatting helpers used by the
//! data and presentation layers.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{Result, StatsError};
