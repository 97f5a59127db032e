//! Mood log backed by a hosted database's REST row API.
//!
//! Rows are inserted with `POST /rest/v1/<table>` and read back with the
//! `select` / `order` / `limit` query operators.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::models::{MoodEvent, NewMoodEvent};
use super::trait_def::{MoodLogError, MoodLogStore};
use crate::config::MoodLogRestSettings;
use crate::server::metrics::record_upstream_call;

pub struct RestMoodLogStore {
    client: Client,
    table_url: String,
    api_key: String,
}

impl RestMoodLogStore {
    pub fn new(settings: &MoodLogRestSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_sec))
            .build()?;

        let table_url = format!(
            "{}/rest/v1/{}",
            settings.base_url.trim_end_matches('/'),
            settings.table
        );

        Ok(Self {
            client,
            table_url,
            api_key: settings.api_key.clone(),
        })
    }

    pub fn table_url(&self) -> &str {
        &self.table_url
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn insert(&self, event: &NewMoodEvent) -> Result<MoodEvent, MoodLogError> {
        let response = self
            .authorized(self.client.post(&self.table_url))
            .header("Prefer", "return=representation")
            .json(event)
            .send()
            .await?;

        // The row API answers an insert with the array of inserted rows.
        let mut rows: Vec<MoodEvent> = decode(response).await?;
        if rows.is_empty() {
            return Err(MoodLogError::Decode(
                "insert returned no rows".to_string(),
            ));
        }
        Ok(rows.swap_remove(0))
    }

    async fn select_recent(&self, limit: usize) -> Result<Vec<MoodEvent>, MoodLogError> {
        let response = self
            .authorized(self.client.get(&self.table_url))
            .query(&[
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;
        decode(response).await
    }
}

#[async_trait]
impl MoodLogStore for RestMoodLogStore {
    async fn record(&self, event: NewMoodEvent) -> Result<MoodEvent, MoodLogError> {
        debug!("Logging mood {} to {}", event.mood, self.table_url);
        let result = self.insert(&event).await;
        record_upstream_call("mood_log", "insert", result.is_ok());
        result
    }

    async fn recent(&self, limit: usize) -> Result<Vec<MoodEvent>, MoodLogError> {
        let result = self.select_recent(limit).await;
        record_upstream_call("mood_log", "select", result.is_ok());
        result
    }

    fn backend_name(&self) -> &'static str {
        "rest"
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, MoodLogError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(MoodLogError::Upstream {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|err| MoodLogError::Decode(err.to_string()))
}
