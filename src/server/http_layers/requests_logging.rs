//! Per-request logging and HTTP metrics.
//!
//! The `path` level only prints the route label, so query strings (search
//! terms among them) stay out of the logs unless headers are requested too.

use std::time::Instant;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header::CONTENT_LENGTH, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{error, info};

use super::super::catalog_routes::error_response;
use super::super::metrics::{normalize_path, record_http_request};
use super::super::state::ServerState;

#[derive(PartialEq, PartialOrd, Clone, Debug, Default, clap::ValueEnum)]
pub enum RequestsLoggingLevel {
    None,
    #[default]
    Path,
    Headers,
    Body,
}

impl std::fmt::Display for RequestsLoggingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Bodies declaring this many bytes or more are summarized, not printed.
const BODY_LOG_LIMIT: usize = 1024;

/// The declared body length, or why it cannot be trusted.
fn declared_length(headers: &HeaderMap) -> Result<usize, &'static str> {
    let value = headers.get(CONTENT_LENGTH).ok_or("no content-length")?;
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .ok_or("unreadable content-length")
}

fn log_headers(direction: &str, headers: &HeaderMap) {
    for (name, value) in headers {
        info!("  {} header {}: {:?}", direction, name, value);
    }
}

/// Prints `body` when it is small enough and returns a body with the same
/// content for the next stage.
async fn log_body(direction: &str, headers: &HeaderMap, body: Body) -> Result<Body, axum::Error> {
    match declared_length(headers) {
        Err(reason) => {
            info!("  {} body not logged: {}", direction, reason);
            Ok(body)
        }
        Ok(len) if len >= BODY_LOG_LIMIT => {
            info!(
                "  {} body not logged: {:#}",
                direction,
                byte_unit::Byte::from(len)
            );
            Ok(body)
        }
        Ok(len) => {
            let bytes = to_bytes(body, len).await?;
            info!("  {} body: {}", direction, String::from_utf8_lossy(&bytes));
            Ok(Body::from(bytes))
        }
    }
}

async fn inspect_request(
    level: &RequestsLoggingLevel,
    request: Request,
) -> Result<Request, axum::Error> {
    if *level >= RequestsLoggingLevel::Headers {
        if let Some(query) = request.uri().query() {
            info!("  req query: {}", query);
        }
        log_headers("req", request.headers());
    }
    if *level < RequestsLoggingLevel::Body {
        return Ok(request);
    }
    let (parts, body) = request.into_parts();
    let body = log_body("req", &parts.headers, body).await?;
    Ok(Request::from_parts(parts, body))
}

async fn inspect_response(
    level: &RequestsLoggingLevel,
    response: Response,
) -> Result<Response, axum::Error> {
    if *level >= RequestsLoggingLevel::Headers {
        log_headers("resp", response.headers());
    }
    if *level < RequestsLoggingLevel::Body {
        return Ok(response);
    }
    let (parts, body) = response.into_parts();
    let body = log_body("resp", &parts.headers, body).await?;
    Ok(Response::from_parts(parts, body))
}

pub async fn log_requests(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Response {
    let level = &state.config.requests_logging_level;
    let started = Instant::now();
    let method = request.method().clone();
    let route = normalize_path(request.uri().path());

    if *level > RequestsLoggingLevel::None {
        info!(">>> {} {}", method, route);
    }

    let response = match inspect_request(level, request).await {
        Ok(request) => next.run(request).await,
        Err(err) => {
            error!("Failed to read request body: {}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read request body")
        }
    };
    let response = match inspect_response(level, response).await {
        Ok(response) => response,
        Err(err) => {
            error!("Failed to read response body: {}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read response body")
        }
    };

    let status = response.status().as_u16();
    let elapsed = started.elapsed();
    if *level > RequestsLoggingLevel::None {
        info!("<<< {} {} {} ({}ms)", status, method, route, elapsed.as_millis());
    }
    record_http_request(method.as_str(), route, status, elapsed);

    response
}
