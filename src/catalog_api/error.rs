use thiserror::Error;

/// Errors returned by the music-catalog client.
#[derive(Debug, Error)]
pub enum CatalogApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Catalog API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Catalog API returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Failed to decode catalog API response: {0}")]
    Decode(String),
}
