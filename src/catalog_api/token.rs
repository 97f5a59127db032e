//! Client-credentials access token caching.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use super::error::CatalogApiError;

/// Tokens are refreshed this long before they actually expire.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Body of the token endpoint's response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_in: u64,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// A usable access token and its remaining lifetime in seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

struct CachedToken {
    access_token: String,
    token_type: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + REFRESH_MARGIN < self.expires_at
    }

    fn to_access_token(&self, now: Instant) -> AccessToken {
        AccessToken {
            access_token: self.access_token.clone(),
            token_type: self.token_type.clone(),
            expires_in: self.expires_at.saturating_duration_since(now).as_secs(),
        }
    }
}

/// Holds at most one token. Concurrent callers that find it stale wait on the
/// same lock, so only one of them hits the token endpoint.
#[derive(Default)]
pub struct TokenCache {
    slot: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached token if it is still fresh, otherwise runs `fetch`
    /// and caches what it returns.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<AccessToken, CatalogApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TokenResponse, CatalogApiError>>,
    {
        let mut slot = self.slot.lock().await;

        let now = Instant::now();
        if let Some(cached) = slot.as_ref() {
            if cached.is_fresh(now) {
                return Ok(cached.to_access_token(now));
            }
        }

        let response = fetch().await?;
        let now = Instant::now();
        let cached = CachedToken {
            access_token: response.access_token,
            token_type: response.token_type,
            expires_at: now + Duration::from_secs(response.expires_in),
        };
        debug!("Cached new access token, expires in {}s", response.expires_in);
        let token = cached.to_access_token(now);
        *slot = Some(cached);
        Ok(token)
    }

    /// Drops the cached token so the next call fetches a new one.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}
