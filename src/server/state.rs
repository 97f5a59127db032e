use axum::extract::FromRef;

use crate::catalog_api::MusicCatalog;
use crate::mood_log::MoodLogStore;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type OptionalCatalog = Option<Arc<dyn MusicCatalog>>;
pub type OptionalMoodLog = Option<Arc<dyn MoodLogStore>>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub hash: String,
    pub catalog: OptionalCatalog,
    pub mood_log: OptionalMoodLog,
}

impl ServerState {
    pub fn new(config: ServerConfig, catalog: OptionalCatalog, mood_log: OptionalMoodLog) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            hash: env!("GIT_HASH").to_owned(),
            catalog,
            mood_log,
        }
    }
}

impl FromRef<ServerState> for OptionalCatalog {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog.clone()
    }
}

impl FromRef<ServerState> for OptionalMoodLog {
    fn from_ref(input: &ServerState) -> Self {
        input.mood_log.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
