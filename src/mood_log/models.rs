use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::trait_def::MoodLogError;
use crate::mood::{AgeBracket, MoodKey};

/// Longest note accepted with a mood event, in characters.
pub const MAX_NOTE_LEN: usize = 500;

/// A mood event about to be written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMoodEvent {
    pub mood: MoodKey,
    pub age_group: Option<AgeBracket>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewMoodEvent {
    /// Validates user input into an event stamped with the current time.
    ///
    /// Unlike feature resolution there is no fallback here: an unknown mood
    /// or age group is rejected rather than logged as something else.
    pub fn from_input(
        mood: &str,
        age_group: Option<&str>,
        note: Option<String>,
    ) -> Result<Self, MoodLogError> {
        let mood = MoodKey::parse(mood)
            .ok_or_else(|| MoodLogError::InvalidEvent(format!("unknown mood '{}'", mood)))?;

        let age_group = match age_group.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(AgeBracket::parse(raw).ok_or_else(|| {
                MoodLogError::InvalidEvent(format!("unknown age group '{}'", raw))
            })?),
            None => None,
        };

        let note = note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if let Some(note) = &note {
            if note.chars().count() > MAX_NOTE_LEN {
                return Err(MoodLogError::InvalidEvent(format!(
                    "note is longer than {} characters",
                    MAX_NOTE_LEN
                )));
            }
        }

        Ok(Self {
            mood,
            age_group,
            note,
            created_at: Utc::now(),
        })
    }
}

/// A stored mood event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEvent {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub mood: String,
    pub age_group: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Backends hand out either integer or string ids.
fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}
