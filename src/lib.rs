use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handlers;
pub mod images;
pub mod metrics;
pub mod models;
pub mod parse;
pub mod push;
pub mod rate_limit;
pub mod state;
pub mod upstream;

use handlers::{
    analyze_handler, check_reminders_handler, health_handler, meals_handler, metrics_handler,
    push_info_handler, send_push_handler, subscribe_handler, unsubscribe_handler,
};
use state::AppState;

// Four images of up to 10MB each arrive base64-inflated, which overflows
// axum's default 2MB body cap.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/meals", post(meals_handler))
        .route(
            "/api/push/subscribe",
            get(push_info_handler)
                .post(subscribe_handler)
                .delete(unsubscribe_handler),
        )
        .route("/api/push/send", post(send_push_handler))
        .route("/api/push/check-reminders", get(check_reminders_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
