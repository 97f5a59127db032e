//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server wired to its own fakes or temp database.

use super::constants::*;
use super::fakes::{FakeCatalogApi, FakeMoodLogApi};
use moodtune_server::catalog_api::{CatalogApiClient, MusicCatalog};
use moodtune_server::config::{CatalogApiSettings, MoodLogRestSettings};
use moodtune_server::mood_log::{MoodLogStore, RestMoodLogStore, SqliteMoodLogStore};
use moodtune_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Builds a real catalog client pointed at a fake catalog API
pub fn catalog_client_for(fake: &FakeCatalogApi) -> CatalogApiClient {
    CatalogApiClient::new(&CatalogApiSettings {
        client_id: TEST_CLIENT_ID.to_string(),
        client_secret: TEST_CLIENT_SECRET.to_string(),
        token_url: fake.token_url(),
        api_base_url: fake.api_base_url(),
        timeout_sec: REQUEST_TIMEOUT_SECS,
    })
    .expect("Failed to build catalog client")
}

/// Builds a real REST mood-log store pointed at a fake backend
pub fn rest_mood_log_for(fake: &FakeMoodLogApi) -> RestMoodLogStore {
    RestMoodLogStore::new(&MoodLogRestSettings {
        base_url: fake.base_url.clone(),
        api_key: TEST_MOOD_LOG_KEY.to_string(),
        table: TEST_MOOD_LOG_TABLE.to_string(),
        timeout_sec: REQUEST_TIMEOUT_SECS,
    })
    .expect("Failed to build mood log store")
}

/// Test server instance
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    // Private fields - keep resources alive until drop
    _temp_db_dir: Option<TempDir>,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server with no upstream configured
    pub async fn spawn() -> Self {
        Self::spawn_with(None, None, None, 0).await
    }

    /// Spawns a server whose mood log is a fresh SQLite file
    pub async fn spawn_with_sqlite_mood_log() -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");
        let store = SqliteMoodLogStore::new(temp_db_dir.path().join("mood_log.db"))
            .expect("Failed to open mood log database");
        Self::spawn_with(None, Some(Arc::new(store)), Some(temp_db_dir), 0).await
    }

    /// Spawns a server talking to the given fakes through the real clients
    pub async fn spawn_with_upstreams(
        catalog: Option<&FakeCatalogApi>,
        mood_log: Option<&FakeMoodLogApi>,
    ) -> Self {
        let catalog = catalog.map(|fake| Arc::new(catalog_client_for(fake)) as Arc<dyn MusicCatalog>);
        let mood_log =
            mood_log.map(|fake| Arc::new(rest_mood_log_for(fake)) as Arc<dyn MoodLogStore>);
        Self::spawn_with(catalog, mood_log, None, 0).await
    }

    /// Spawns a server with a response cache age, to check cache headers
    pub async fn spawn_with_cache_age(content_cache_age_sec: usize) -> Self {
        Self::spawn_with(None, None, None, content_cache_age_sec).await
    }

    /// Spawns a new test server on a random port
    ///
    /// This function:
    /// 1. Binds to a random port (127.0.0.1:0)
    /// 2. Spawns the server in a background task
    /// 3. Waits for the server to be ready
    ///
    /// # Panics
    ///
    /// Panics if port binding fails or the server doesn't become ready within timeout
    async fn spawn_with(
        catalog: Option<Arc<dyn MusicCatalog>>,
        mood_log: Option<Arc<dyn MoodLogStore>>,
        temp_db_dir: Option<TempDir>,
        content_cache_age_sec: usize,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            metrics_port: 0,
            requests_logging_level: RequestsLoggingLevel::None,
            content_cache_age_sec,
            frontend_dir_path: None,
        };
        let app = make_app(config, catalog, mood_log);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the / endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
        // TempDir will be cleaned up automatically
    }
}
