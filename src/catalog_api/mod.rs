//! Client for the external music-catalog API.
//!
//! Covers the client-credentials token exchange, track search, and the
//! recommendation query built from a resolved mood profile.

mod client;
mod error;
mod models;
mod token;

pub use client::{CatalogApiClient, MusicCatalog};
pub use error::CatalogApiError;
pub use models::Track;
pub use token::{AccessToken, TokenCache, TokenResponse};

/// Bounds for the `limit` parameter of a track search.
pub const SEARCH_LIMIT_RANGE: (u32, u32) = (1, 50);
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// Bounds for the `limit` parameter of a recommendation query.
pub const RECOMMENDATIONS_LIMIT_RANGE: (u32, u32) = (1, 100);
pub const DEFAULT_RECOMMENDATIONS_LIMIT: u32 = 20;
