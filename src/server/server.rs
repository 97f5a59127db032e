use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};

use tower_http::services::ServeDir;
use tracing::info;

use axum::{
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

#[cfg(feature = "slowdown")]
use super::slowdown_request;
use super::{
    catalog_routes::make_catalog_routes, log_requests, metrics::metrics_handler,
    mood_routes::make_mood_routes, state::*, ServerConfig,
};
use crate::catalog_api::MusicCatalog;
use crate::mood_log::MoodLogStore;

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

#[derive(Serialize)]
struct HealthResponse {
    pub status: &'static str,
    pub catalog_configured: bool,
    pub mood_log_backend: Option<&'static str>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

async fn health(State(state): State<ServerState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        catalog_configured: state.catalog.is_some(),
        mood_log_backend: state.mood_log.as_ref().map(|store| store.backend_name()),
    })
}

pub fn make_app(
    config: ServerConfig,
    catalog: Option<Arc<dyn MusicCatalog>>,
    mood_log: Option<Arc<dyn MoodLogStore>>,
) -> Router {
    let state = ServerState::new(config.clone(), catalog, mood_log);

    let health_routes: Router = Router::new()
        .route("/v1/health", get(health))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    #[allow(unused_mut)]
    let mut app: Router = home_router
        .merge(health_routes)
        .merge(make_mood_routes(state.clone()))
        .nest("/v1/catalog", make_catalog_routes(state.clone()));

    #[cfg(feature = "slowdown")]
    {
        app = app.layer(middleware::from_fn(slowdown_request));
    }
    app.layer(middleware::from_fn_with_state(state, log_requests))
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

pub async fn run_server(
    config: ServerConfig,
    catalog: Option<Arc<dyn MusicCatalog>>,
    mood_log: Option<Arc<dyn MoodLogStore>>,
) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, catalog, mood_log);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    let metrics_server = tokio::spawn(async move {
        axum::serve(metrics_listener, make_metrics_app()).await
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    metrics_server.abort();
    Ok(())
}
