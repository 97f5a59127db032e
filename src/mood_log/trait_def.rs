//! MoodLogStore trait definition.

use async_trait::async_trait;
use thiserror::Error;

use super::models::{MoodEvent, NewMoodEvent};

#[derive(Debug, Error)]
pub enum MoodLogError {
    #[error("Invalid mood event: {0}")]
    InvalidEvent(String),

    #[error("Mood log request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Mood log backend returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Failed to decode mood log response: {0}")]
    Decode(String),

    #[error("Mood log database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for MoodLogError {
    fn from(err: rusqlite::Error) -> Self {
        MoodLogError::Database(err.to_string())
    }
}

/// Storage backend for mood events.
#[async_trait]
pub trait MoodLogStore: Send + Sync {
    /// Append an event and return it as stored.
    async fn record(&self, event: NewMoodEvent) -> Result<MoodEvent, MoodLogError>;

    /// Most recent events first, at most `limit` of them.
    async fn recent(&self, limit: usize) -> Result<Vec<MoodEvent>, MoodLogError>;

    /// Short backend name, used in logs and the health endpoint.
    fn backend_name(&self) -> &'static str;
}
