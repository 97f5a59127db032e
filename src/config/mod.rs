mod file_config;

pub use file_config::{CatalogApiConfig, FileConfig, MoodLogConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_MOOD_LOG_TABLE: &str = "mood_logs";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,
    pub upstream_timeout_sec: u64,
    pub catalog_client_id: Option<String>,
    pub catalog_client_secret: Option<String>,
    pub catalog_token_url: Option<String>,
    pub catalog_api_base_url: Option<String>,
    pub mood_log_url: Option<String>,
    pub mood_log_key: Option<String>,
    pub mood_log_table: Option<String>,
    pub mood_log_db: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,

    /// None when no client credentials were provided.
    pub catalog_api: Option<CatalogApiSettings>,
    pub mood_log: MoodLogSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogApiSettings {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
    pub api_base_url: String,
    pub timeout_sec: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoodLogRestSettings {
    pub base_url: String,
    pub api_key: String,
    pub table: String,
    pub timeout_sec: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoodLogSettings {
    Rest(MoodLogRestSettings),
    Sqlite(PathBuf),
    Disabled,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);
        if port == metrics_port && port != 0 {
            bail!("port and metrics_port must differ (both are {})", port);
        }

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let content_cache_age_sec = file
            .content_cache_age_sec
            .unwrap_or(cli.content_cache_age_sec);
        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());
        let timeout_sec = file
            .upstream_timeout_sec
            .unwrap_or(cli.upstream_timeout_sec);

        let catalog_file = file.catalog_api.unwrap_or_default();
        let client_id = non_empty(catalog_file.client_id)
            .or_else(|| non_empty(cli.catalog_client_id.clone()));
        let client_secret = non_empty(catalog_file.client_secret)
            .or_else(|| non_empty(cli.catalog_client_secret.clone()));
        let catalog_api = match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Some(CatalogApiSettings {
                client_id,
                client_secret,
                token_url: non_empty(catalog_file.token_url)
                    .or_else(|| non_empty(cli.catalog_token_url.clone()))
                    .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
                api_base_url: non_empty(catalog_file.api_base_url)
                    .or_else(|| non_empty(cli.catalog_api_base_url.clone()))
                    .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
                timeout_sec,
            }),
            (None, None) => None,
            _ => bail!("Catalog client id and client secret must be provided together"),
        };

        let mood_log_file = file.mood_log.unwrap_or_default();
        let mood_log_url =
            non_empty(mood_log_file.url).or_else(|| non_empty(cli.mood_log_url.clone()));
        let mood_log_key =
            non_empty(mood_log_file.api_key).or_else(|| non_empty(cli.mood_log_key.clone()));
        let mood_log_db = mood_log_file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.mood_log_db.clone());

        let mood_log = match (mood_log_url, mood_log_key) {
            (Some(base_url), Some(api_key)) => MoodLogSettings::Rest(MoodLogRestSettings {
                base_url,
                api_key,
                table: non_empty(mood_log_file.table)
                    .or_else(|| non_empty(cli.mood_log_table.clone()))
                    .unwrap_or_else(|| DEFAULT_MOOD_LOG_TABLE.to_string()),
                timeout_sec,
            }),
            (None, None) => match mood_log_db {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        if !parent.as_os_str().is_empty() && !parent.is_dir() {
                            bail!("Mood log database directory does not exist: {:?}", parent);
                        }
                    }
                    MoodLogSettings::Sqlite(path)
                }
                None => MoodLogSettings::Disabled,
            },
            _ => bail!("Mood log URL and API key must be provided together"),
        };

        Ok(Self {
            port,
            metrics_port,
            logging_level,
            content_cache_age_sec,
            frontend_dir_path,
            catalog_api,
            mood_log,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
