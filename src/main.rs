use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::{fmt::Debug, path::PathBuf};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use moodtune_server::catalog_api::{CatalogApiClient, MusicCatalog};
use moodtune_server::config::{AppConfig, CliConfig, FileConfig, MoodLogSettings};
use moodtune_server::mood_log::{MoodLogStore, RestMoodLogStore, SqliteMoodLogStore};
use moodtune_server::server::{self, run_server, RequestsLoggingLevel, ServerConfig};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// The maximum age of feature responses in client caches, in seconds.
    #[clap(long, default_value_t = 3600)]
    pub content_cache_age_sec: usize,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Timeout in seconds for requests to upstream services.
    #[clap(long, default_value_t = 15)]
    pub upstream_timeout_sec: u64,

    /// Client id for the music-catalog API.
    #[clap(long, env = "CATALOG_CLIENT_ID", hide_env_values = true)]
    pub catalog_client_id: Option<String>,

    /// Client secret for the music-catalog API.
    #[clap(long, env = "CATALOG_CLIENT_SECRET", hide_env_values = true)]
    pub catalog_client_secret: Option<String>,

    /// Token endpoint of the music-catalog API.
    #[clap(long)]
    pub catalog_token_url: Option<String>,

    /// Base URL of the music-catalog API.
    #[clap(long)]
    pub catalog_api_base_url: Option<String>,

    /// Base URL of the hosted mood-log database.
    #[clap(long, env = "MOOD_LOG_URL")]
    pub mood_log_url: Option<String>,

    /// API key of the hosted mood-log database.
    #[clap(long, env = "MOOD_LOG_KEY", hide_env_values = true)]
    pub mood_log_key: Option<String>,

    /// Table that holds mood events in the hosted database.
    #[clap(long)]
    pub mood_log_table: Option<String>,

    /// Path to a local SQLite file for mood events, used when no hosted database is set.
    #[clap(long, value_parser = parse_path)]
    pub mood_log_db: Option<PathBuf>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            port: self.port,
            metrics_port: self.metrics_port,
            logging_level: self.logging_level.clone(),
            content_cache_age_sec: self.content_cache_age_sec,
            frontend_dir_path: self.frontend_dir_path.clone(),
            upstream_timeout_sec: self.upstream_timeout_sec,
            catalog_client_id: self.catalog_client_id.clone(),
            catalog_client_secret: self.catalog_client_secret.clone(),
            catalog_token_url: self.catalog_token_url.clone(),
            catalog_api_base_url: self.catalog_api_base_url.clone(),
            mood_log_url: self.mood_log_url.clone(),
            mood_log_key: self.mood_log_key.clone(),
            mood_log_table: self.mood_log_table.clone(),
            mood_log_db: self.mood_log_db.clone(),
        }
    }
}

fn build_catalog(config: &AppConfig) -> Result<Option<Arc<dyn MusicCatalog>>> {
    let Some(settings) = &config.catalog_api else {
        warn!("No catalog API credentials configured, catalog routes will answer 503");
        return Ok(None);
    };

    let client = CatalogApiClient::new(settings).context("Failed to create catalog API client")?;
    info!("Catalog API configured at {}", client.api_base_url());
    Ok(Some(Arc::new(client)))
}

fn build_mood_log(config: &AppConfig) -> Result<Option<Arc<dyn MoodLogStore>>> {
    let store: Arc<dyn MoodLogStore> = match &config.mood_log {
        MoodLogSettings::Rest(settings) => {
            let store =
                RestMoodLogStore::new(settings).context("Failed to create mood log client")?;
            info!("Mood log stored in hosted table {}", store.table_url());
            Arc::new(store)
        }
        MoodLogSettings::Sqlite(path) => {
            info!("Opening SQLite mood log at {:?}...", path);
            Arc::new(SqliteMoodLogStore::new(path)?)
        }
        MoodLogSettings::Disabled => {
            warn!("No mood log configured, mood log routes will answer 503");
            return Ok(None);
        }
    };
    Ok(Some(store))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Initializing metrics...");
    server::metrics::init_metrics();

    let catalog = build_catalog(&app_config)?;
    let mood_log = build_mood_log(&app_config)?;

    run_server(ServerConfig::from(&app_config), catalog, mood_log).await
}
