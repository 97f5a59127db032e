//! HTTP client for the music-catalog API.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::CatalogApiError;
use super::models::{into_tracks, RecommendationsResponse, SearchResponse, Track};
use super::token::{AccessToken, TokenCache, TokenResponse};
use super::{
    DEFAULT_RECOMMENDATIONS_LIMIT, DEFAULT_SEARCH_LIMIT, RECOMMENDATIONS_LIMIT_RANGE,
    SEARCH_LIMIT_RANGE,
};
use crate::config::CatalogApiSettings;
use crate::mood::FeatureQuery;
use crate::server::metrics::{record_token_refresh, record_upstream_call};

/// Upstream error bodies are cut to this many bytes before being surfaced.
const MAX_ERROR_BODY_LEN: usize = 512;

/// Operations the server needs from a music catalog.
#[async_trait]
pub trait MusicCatalog: Send + Sync {
    /// Get a valid access token, exchanging client credentials if needed.
    async fn access_token(&self) -> Result<AccessToken, CatalogApiError>;

    /// Search tracks by free text.
    async fn search_tracks(
        &self,
        query: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Track>, CatalogApiError>;

    /// Get track recommendations for the given feature targets.
    async fn recommendations(
        &self,
        features: &FeatureQuery,
        limit: Option<u32>,
    ) -> Result<Vec<Track>, CatalogApiError>;
}

pub struct CatalogApiClient {
    client: Client,
    client_id: String,
    client_secret: String,
    token_url: String,
    api_base_url: String,
    tokens: TokenCache,
}

impl CatalogApiClient {
    pub fn new(settings: &CatalogApiSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_sec))
            .build()?;

        Ok(Self {
            client,
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            token_url: settings.token_url.clone(),
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            tokens: TokenCache::new(),
        })
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    async fn request_token(&self) -> Result<TokenResponse, CatalogApiError> {
        debug!("Requesting catalog access token from {}", self.token_url);
        record_token_refresh();
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        decode(response).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, CatalogApiError> {
        let token = self.access_token().await?;
        let url = format!("{}{}", self.api_base_url, path);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token.access_token)
            .query(query)
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Catalog API rejected access token, dropping it from cache");
            self.tokens.invalidate().await;
        }

        decode(response).await
    }
}

#[async_trait]
impl MusicCatalog for CatalogApiClient {
    async fn access_token(&self) -> Result<AccessToken, CatalogApiError> {
        let result = self.tokens.get_or_fetch(|| self.request_token()).await;
        record_upstream_call("catalog", "token", result.is_ok());
        result
    }

    async fn search_tracks(
        &self,
        query: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Track>, CatalogApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CatalogApiError::InvalidRequest(
                "search query must not be empty".to_string(),
            ));
        }
        let limit = clamp_limit(limit, DEFAULT_SEARCH_LIMIT, SEARCH_LIMIT_RANGE);

        let params = [
            ("q", query.to_string()),
            ("type", "track".to_string()),
            ("limit", limit.to_string()),
        ];
        let result = self
            .get_json::<SearchResponse>("/search", &params)
            .await
            .map(|body| body.tracks.map(|page| into_tracks(page.items)).unwrap_or_default());
        record_upstream_call("catalog", "search", result.is_ok());
        result
    }

    async fn recommendations(
        &self,
        features: &FeatureQuery,
        limit: Option<u32>,
    ) -> Result<Vec<Track>, CatalogApiError> {
        let limit = clamp_limit(
            limit,
            DEFAULT_RECOMMENDATIONS_LIMIT,
            RECOMMENDATIONS_LIMIT_RANGE,
        );
        let mut params = features.to_query_pairs();
        params.push(("limit", limit.to_string()));

        let result = self
            .get_json::<RecommendationsResponse>("/recommendations", &params)
            .await
            .map(|body| into_tracks(body.tracks));
        record_upstream_call("catalog", "recommendations", result.is_ok());
        result
    }
}

pub(super) fn clamp_limit(limit: Option<u32>, default: u32, (min, max): (u32, u32)) -> u32 {
    limit.unwrap_or(default).clamp(min, max)
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, CatalogApiError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(CatalogApiError::Upstream {
            status: status.as_u16(),
            body: truncate(body, MAX_ERROR_BODY_LEN),
        });
    }

    serde_json::from_str(&body).map_err(|err| CatalogApiError::Decode(err.to_string()))
}

fn truncate(mut s: String, max_len: usize) -> String {
    if s.len() > max_len {
        let mut cut = max_len;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
    }
    s
}
