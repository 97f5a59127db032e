//! Mood event log.
//!
//! Mood selections are appended to a hosted relational backend through its
//! REST row API, or to a local SQLite file when no hosted backend is set up.

mod models;
mod rest_store;
mod schema;
mod sqlite_store;
mod trait_def;

pub use models::{MoodEvent, NewMoodEvent, MAX_NOTE_LEN};
pub use rest_store::RestMoodLogStore;
pub use sqlite_store::SqliteMoodLogStore;
pub use trait_def::{MoodLogError, MoodLogStore};

/// Bounds for how many events a `recent` call returns.
pub const RECENT_LIMIT_RANGE: (usize, usize) = (1, 100);
pub const DEFAULT_RECENT_LIMIT: usize = 20;

pub fn clamp_recent_limit(limit: Option<usize>) -> usize {
    let (min, max) = RECENT_LIMIT_RANGE;
    limit.unwrap_or(DEFAULT_RECENT_LIMIT).clamp(min, max)
}
