//! Routes backed by the external music catalog.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::state::{OptionalCatalog, ServerState};
use crate::catalog_api::{CatalogApiError, MusicCatalog, Track};
use crate::mood::{resolve, FeatureQuery};

#[derive(Serialize)]
pub(super) struct ErrorBody {
    pub error: String,
}

pub(super) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for CatalogApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            CatalogApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CatalogApiError::Transport(_)
            | CatalogApiError::Upstream { .. }
            | CatalogApiError::Decode(_) => StatusCode::BAD_GATEWAY,
        };
        if status == StatusCode::BAD_GATEWAY {
            warn!("Catalog API call failed: {}", self);
        }
        error_response(status, self.to_string())
    }
}

fn get_catalog(catalog: &OptionalCatalog) -> Result<&dyn MusicCatalog, Response> {
    catalog.as_ref().map(|arc| arc.as_ref()).ok_or_else(|| {
        error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Catalog API credentials not configured",
        )
    })
}

#[derive(Deserialize, Debug)]
struct SearchParams {
    q: Option<String>,
    limit: Option<u32>,
}

#[derive(Deserialize, Debug)]
struct RecommendationsParams {
    mood: Option<String>,
    age_group: Option<String>,
    limit: Option<u32>,
}

#[derive(Serialize)]
struct RecommendationsResponse {
    features: FeatureQuery,
    tracks: Vec<Track>,
}

/// GET /token - Current access token, exchanged on demand
async fn get_token(State(catalog): State<OptionalCatalog>) -> Response {
    let catalog = match get_catalog(&catalog) {
        Ok(c) => c,
        Err(response) => return response,
    };

    match catalog.access_token().await {
        Ok(token) => Json(token).into_response(),
        Err(err) => err.into_response(),
    }
}

/// GET /search - Free-text track search
async fn search_tracks(
    State(catalog): State<OptionalCatalog>,
    Query(params): Query<SearchParams>,
) -> Response {
    let catalog = match get_catalog(&catalog) {
        Ok(c) => c,
        Err(response) => return response,
    };

    let query = params.q.unwrap_or_default();
    debug!("Searching catalog for {:?}", query);
    match catalog.search_tracks(&query, params.limit).await {
        Ok(tracks) => Json(tracks).into_response(),
        Err(err) => err.into_response(),
    }
}

/// GET /recommendations - Tracks matching the features resolved for a mood
async fn get_recommendations(
    State(catalog): State<OptionalCatalog>,
    Query(params): Query<RecommendationsParams>,
) -> Response {
    let catalog = match get_catalog(&catalog) {
        Ok(c) => c,
        Err(response) => return response,
    };

    let resolved = resolve(
        params.mood.as_deref().unwrap_or_default(),
        params.age_group.as_deref(),
    );
    let features = resolved.to_query();

    match catalog.recommendations(&features, params.limit).await {
        Ok(tracks) => Json(RecommendationsResponse { features, tracks }).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn make_catalog_routes(state: ServerState) -> Router {
    Router::new()
        .route("/token", get(get_token))
        .route("/search", get(search_tracks))
        .route("/recommendations", get(get_recommendations))
        .with_state(state)
}
