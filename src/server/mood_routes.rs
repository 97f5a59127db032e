//! Mood catalog, feature resolution and the mood log.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::catalog_routes::error_response;
use super::http_cache;
use super::metrics::{record_feature_resolution, record_mood_event};
use super::state::{OptionalMoodLog, ServerState};
use crate::mood::{resolve, AgeBracket, MoodKey, DEFAULT_AGE_GROUP};
use crate::mood_log::{clamp_recent_limit, MoodLogError, MoodLogStore, NewMoodEvent};

impl IntoResponse for MoodLogError {
    fn into_response(self) -> Response {
        let status = match &self {
            MoodLogError::InvalidEvent(_) => StatusCode::BAD_REQUEST,
            MoodLogError::Transport(_) | MoodLogError::Upstream { .. } | MoodLogError::Decode(_) => {
                warn!("Mood log backend call failed: {}", self);
                StatusCode::BAD_GATEWAY
            }
            MoodLogError::Database(_) => {
                error!("Mood log database failure: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        error_response(status, self.to_string())
    }
}

fn get_mood_log(mood_log: &OptionalMoodLog) -> Result<&dyn MoodLogStore, Response> {
    mood_log.as_ref().map(|arc| arc.as_ref()).ok_or_else(|| {
        error_response(StatusCode::SERVICE_UNAVAILABLE, "Mood log not configured")
    })
}

#[derive(Serialize)]
struct MoodOption {
    mood: MoodKey,
    genre_seeds: &'static str,
}

#[derive(Serialize)]
struct MoodsResponse {
    moods: Vec<MoodOption>,
    age_groups: Vec<AgeBracket>,
    default_age_group: &'static str,
}

#[derive(Deserialize, Debug)]
struct FeaturesParams {
    mood: Option<String>,
    age_group: Option<String>,
}

#[derive(Deserialize, Debug)]
struct LogMoodBody {
    mood: String,
    age_group: Option<String>,
    note: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RecentParams {
    limit: Option<usize>,
}

/// GET /v1/moods - Known moods and age groups
async fn get_moods() -> impl IntoResponse {
    Json(MoodsResponse {
        moods: MoodKey::ALL
            .iter()
            .map(|&mood| MoodOption {
                mood,
                genre_seeds: mood.genre_seeds(),
            })
            .collect(),
        age_groups: AgeBracket::ALL.to_vec(),
        default_age_group: DEFAULT_AGE_GROUP,
    })
}

/// GET /v1/features - Rounded feature targets for a mood and age group
async fn get_features(Query(params): Query<FeaturesParams>) -> impl IntoResponse {
    let resolved = resolve(
        params.mood.as_deref().unwrap_or_default(),
        params.age_group.as_deref(),
    );
    record_feature_resolution(resolved.mood.as_str());
    Json(resolved.to_query())
}

/// POST /v1/moods/log - Append a mood event
async fn log_mood(
    State(mood_log): State<OptionalMoodLog>,
    body: Result<Json<LogMoodBody>, JsonRejection>,
) -> Response {
    let store = match get_mood_log(&mood_log) {
        Ok(s) => s,
        Err(response) => return response,
    };

    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let event = match NewMoodEvent::from_input(&body.mood, body.age_group.as_deref(), body.note) {
        Ok(event) => event,
        Err(err) => return err.into_response(),
    };

    debug!("Logging mood {} to {} store", event.mood, store.backend_name());
    match store.record(event).await {
        Ok(stored) => {
            record_mood_event(&stored.mood);
            (StatusCode::CREATED, Json(stored)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

/// GET /v1/moods/recent - Most recent mood events, newest first
async fn get_recent_moods(
    State(mood_log): State<OptionalMoodLog>,
    Query(params): Query<RecentParams>,
) -> Response {
    let store = match get_mood_log(&mood_log) {
        Ok(s) => s,
        Err(response) => return response,
    };

    match store.recent(clamp_recent_limit(params.limit)).await {
        Ok(events) => Json(events).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn make_mood_routes(state: ServerState) -> Router {
    let features_routes: Router = Router::new()
        .route("/v1/features", get(get_features))
        .layer(middleware::from_fn_with_state(
            state.config.content_cache_age_sec,
            http_cache,
        ));

    Router::new()
        .route("/v1/moods", get(get_moods))
        .route("/v1/moods/log", post(log_mood))
        .route("/v1/moods/recent", get(get_recent_moods))
        .with_state(state)
        .merge(features_routes)
}
