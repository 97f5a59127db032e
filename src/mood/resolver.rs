use serde::Serialize;

use super::query::FeatureQuery;
use super::tables::{AgeAdjustment, AgeBracket, AudioFeatureProfile, MoodKey, FALLBACK_GENRES};

/// Age group assumed when the caller does not provide one.
pub const DEFAULT_AGE_GROUP: &str = "18-25";

/// Outcome of resolving a (mood, age group) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFeatures {
    /// The mood whose profile was used (happy when the input was unknown).
    pub mood: MoodKey,
    /// The bracket whose adjustment was applied, if any.
    pub age_bracket: Option<AgeBracket>,
    pub profile: AudioFeatureProfile,
    pub genre_seeds: &'static str,
}

impl ResolvedFeatures {
    pub fn to_query(&self) -> FeatureQuery {
        FeatureQuery::from_resolved(self)
    }
}

/// Resolves the target audio features for `mood` and `age_group`.
///
/// Unknown moods use the happy profile and the fallback genres. A missing age
/// group means [`DEFAULT_AGE_GROUP`]. Any string that names no bracket,
/// including a blank one, applies no adjustment at all.
pub fn resolve(mood: &str, age_group: Option<&str>) -> ResolvedFeatures {
    let mood_key = MoodKey::parse(mood);
    let base = mood_key.unwrap_or(MoodKey::Happy).base_profile();
    let genre_seeds = mood_key.map_or(FALLBACK_GENRES, |m| m.genre_seeds());

    let age_bracket = AgeBracket::parse(age_group.unwrap_or(DEFAULT_AGE_GROUP));
    let adjustment = age_bracket.map_or(AgeAdjustment::NONE, |b| b.adjustment());

    ResolvedFeatures {
        mood: mood_key.unwrap_or(MoodKey::Happy),
        age_bracket,
        profile: base.adjusted(&adjustment),
        genre_seeds,
    }
}
