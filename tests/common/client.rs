//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await
            .unwrap_or_else(|e| panic!("GET {} failed: {}", path, e))
    }

    // ========================================================================
    // Server Endpoints
    // ========================================================================

    /// GET /
    pub async fn get_home(&self) -> Response {
        self.get("/", &[]).await
    }

    /// GET /v1/health
    pub async fn get_health(&self) -> Response {
        self.get("/v1/health", &[]).await
    }

    // ========================================================================
    // Mood Endpoints
    // ========================================================================

    /// GET /v1/moods
    pub async fn get_moods(&self) -> Response {
        self.get("/v1/moods", &[]).await
    }

    /// GET /v1/features
    pub async fn get_features(&self, mood: &str, age_group: Option<&str>) -> Response {
        let mut query = vec![("mood", mood.to_string())];
        if let Some(age_group) = age_group {
            query.push(("age_group", age_group.to_string()));
        }
        self.get("/v1/features", &query).await
    }

    /// POST /v1/moods/log
    pub async fn log_mood(&self, mood: &str, age_group: Option<&str>, note: Option<&str>) -> Response {
        self.log_mood_raw(json!({
            "mood": mood,
            "age_group": age_group,
            "note": note,
        }))
        .await
    }

    /// POST /v1/moods/log with an arbitrary JSON body
    pub async fn log_mood_raw(&self, body: Value) -> Response {
        self.client
            .post(format!("{}/v1/moods/log", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Log mood request failed")
    }

    /// POST /v1/moods/log with a non-JSON body
    pub async fn log_mood_plain_text(&self, body: &str) -> Response {
        self.client
            .post(format!("{}/v1/moods/log", self.base_url))
            .header("content-type", "text/plain")
            .body(body.to_string())
            .send()
            .await
            .expect("Log mood request failed")
    }

    /// GET /v1/moods/recent
    pub async fn get_recent_moods(&self, limit: Option<usize>) -> Response {
        let query: Vec<_> = limit.map(|l| ("limit", l.to_string())).into_iter().collect();
        self.get("/v1/moods/recent", &query).await
    }

    // ========================================================================
    // Catalog Endpoints
    // ========================================================================

    /// GET /v1/catalog/token
    pub async fn get_token(&self) -> Response {
        self.get("/v1/catalog/token", &[]).await
    }

    /// GET /v1/catalog/search
    pub async fn search(&self, q: &str, limit: Option<u32>) -> Response {
        let mut query = vec![("q", q.to_string())];
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        self.get("/v1/catalog/search", &query).await
    }

    /// GET /v1/catalog/recommendations
    pub async fn get_recommendations(
        &self,
        mood: &str,
        age_group: Option<&str>,
        limit: Option<u32>,
    ) -> Response {
        let mut query = vec![("mood", mood.to_string())];
        if let Some(age_group) = age_group {
            query.push(("age_group", age_group.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        self.get("/v1/catalog/recommendations", &query).await
    }
}
