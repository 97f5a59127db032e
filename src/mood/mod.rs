//! Mood to audio-feature resolution.
//!
//! Turns a user's mood and age group into the target audio features and genre
//! seeds that parameterize a recommendation query. Everything in here is pure:
//! the tables are constants and resolution never fails.

mod query;
mod resolver;
mod tables;

pub use query::FeatureQuery;
pub use resolver::{resolve, ResolvedFeatures, DEFAULT_AGE_GROUP};
pub use tables::{
    AgeAdjustment, AgeBracket, AudioFeatureProfile, MoodKey, FALLBACK_GENRES, MIN_TEMPO,
};
