//! MoodTune Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod catalog_api;
pub mod config;
pub mod mood;
pub mod mood_log;
pub mod server;

// Re-export commonly used types for convenience
pub use catalog_api::{CatalogApiClient, MusicCatalog};
pub use mood::{resolve, FeatureQuery, ResolvedFeatures};
pub use mood_log::{MoodLogStore, RestMoodLogStore, SqliteMoodLogStore};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
