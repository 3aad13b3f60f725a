use axum::http::HeaderMap;
use axum::{Json, extract::State};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::ApiError;
use crate::images::{collect_images, validate_images};
use crate::metrics::{RATE_LIMITED_TOTAL, REQUEST_TOTAL};
use crate::models::AnalysisResult;
use crate::parse::parse_analysis;
use crate::rate_limit::client_identifier;
use crate::state::AppState;
use crate::upstream::UpstreamError;

// Rate-limit gate shared by the two model-backed routes, keyed per route
// per client. Runs before any input validation.
pub(super) fn gate(state: &AppState, route: &str, headers: &HeaderMap) -> Result<String, ApiError> {
    REQUEST_TOTAL.inc();

    let client = client_identifier(headers);
    let decision = state.rate_limiter.check(&format!("{route}:{client}"));
    if !decision.allowed {
        RATE_LIMITED_TOTAL.inc();
        return Err(ApiError::RateLimited {
            retry_after_secs: decision.retry_after.as_secs().max(1),
            reset_unix_ms: decision.reset_unix_ms,
        });
    }

    Ok(client)
}

// Client-facing messages stay generic; the specific failure goes to the log.
pub(super) fn map_upstream_error(err: UpstreamError) -> ApiError {
    match err {
        UpstreamError::Auth => {
            error!("model provider rejected the configured credentials");
            ApiError::Internal("Internal server error")
        }
        UpstreamError::RateLimited => {
            ApiError::Unavailable("The analysis service is busy. Please try again shortly.")
        }
        other => {
            error!(error = %other, "model provider call failed");
            ApiError::Unavailable("The analysis service is temporarily unavailable")
        }
    }
}

pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let client = gate(&state, "analyze", &headers)?;

    let images = collect_images(&body)?;
    validate_images(&images)?;

    let upstream = state.upstream.as_ref().ok_or(ApiError::Unavailable(
        "Food analysis is not configured on this server",
    ))?;

    info!(client = %client, images = images.len(), "analyzing food images");

    let reply = upstream
        .analyze_images(&images)
        .await
        .map_err(map_upstream_error)?;

    Ok(Json(parse_analysis(&reply)))
}
