//! API error taxonomy, mapped to HTTP status codes at the handler boundary.
//!
//! Client-visible messages are fixed and generic; anything diagnostic is
//! logged server-side where the error is produced, never echoed back.

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Too many requests. Please try again later.")]
    RateLimited {
        retry_after_secs: u64,
        reset_unix_ms: i64,
    },

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Unavailable(&'static str),

    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        match self {
            ApiError::RateLimited {
                retry_after_secs,
                reset_unix_ms,
            } => (
                status,
                [(header::RETRY_AFTER, retry_after_secs.to_string())],
                Json(serde_json::json!({
                    "error": message,
                    "retryAfter": retry_after_secs,
                    "resetTime": reset_unix_ms,
                })),
            )
                .into_response(),
            _ => (status, Json(serde_json::json!({ "error": message }))).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_map_to_expected_status_codes() {
        assert_eq!(
            ApiError::BadRequest("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::RateLimited {
                retry_after_secs: 30,
                reset_unix_ms: 0
            }
            .status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::NotFound("gone").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Unavailable("down").status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Internal("oops").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn rate_limited_response_carries_retry_after_header() {
        let resp = ApiError::RateLimited {
            retry_after_secs: 42,
            reset_unix_ms: 1_700_000_000_000,
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(resp.headers().get(header::RETRY_AFTER).unwrap(), "42");
    }
}
