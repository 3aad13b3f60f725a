use axum::{Json, extract::State};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::metrics::{PUSH_SENT_TOTAL, SUBSCRIPTIONS};
use crate::models::{SendPushRequest, SubscribeRequest, UnsubscribeRequest};
use crate::push::{PushError, PushPayload, derive_user_id};
use crate::state::AppState;

fn bad_payload(_: serde_json::Error) -> ApiError {
    ApiError::BadRequest("Invalid request payload".to_string())
}

// Clients fetch the VAPID public key here before subscribing, or learn
// that push is disabled on this deployment.
pub async fn push_info_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    match &state.push {
        Some(sender) => Json(json!({
            "vapidPublicKey": sender.public_key(),
            "configured": true,
        })),
        None => Json(json!({
            "vapidPublicKey": Value::Null,
            "configured": false,
        })),
    }
}

pub async fn subscribe_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let req: SubscribeRequest = serde_json::from_value(body).map_err(bad_payload)?;

    let subscription = req.subscription.ok_or_else(|| {
        ApiError::BadRequest("subscription with endpoint and keys is required".to_string())
    })?;
    if subscription.endpoint.is_empty()
        || subscription.keys.p256dh.is_empty()
        || subscription.keys.auth.is_empty()
    {
        return Err(ApiError::BadRequest(
            "subscription endpoint and keys must be non-empty".to_string(),
        ));
    }

    // re-subscribing the same endpoint lands on the same derived id
    let user_id = req
        .user_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| derive_user_id(&subscription.endpoint));

    state.subscriptions.save(user_id.clone(), subscription);
    SUBSCRIPTIONS.set(state.subscriptions.len() as f64);
    info!(user_id = %user_id, "push subscription stored");

    Ok(Json(json!({ "success": true, "userId": user_id })))
}

pub async fn unsubscribe_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let req: UnsubscribeRequest = serde_json::from_value(body).map_err(bad_payload)?;

    let user_id = resolve_user_id(req.user_id, req.endpoint)?;

    if !state.subscriptions.remove(&user_id) {
        return Err(ApiError::NotFound("No subscription found for this user"));
    }
    SUBSCRIPTIONS.set(state.subscriptions.len() as f64);
    info!(user_id = %user_id, "push subscription removed");

    Ok(Json(json!({ "success": true })))
}

pub async fn send_push_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let req: SendPushRequest = serde_json::from_value(body).map_err(bad_payload)?;

    let title = req
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("title is required".to_string()))?;

    let user_id = resolve_user_id(req.user_id, req.endpoint)?;

    let subscription = state
        .subscriptions
        .get(&user_id)
        .ok_or(ApiError::NotFound("No subscription found for this user"))?;

    let sender = state.push.as_ref().ok_or(ApiError::Unavailable(
        "Push notifications are not configured on this server",
    ))?;

    let payload = PushPayload {
        title,
        body: req.body.unwrap_or_default(),
        data: req.data,
    };

    match sender.send(&subscription, &payload).await {
        Ok(()) => {
            PUSH_SENT_TOTAL.inc();
            info!(user_id = %user_id, "push notification sent");
            Ok(Json(json!({ "success": true })))
        }
        Err(PushError::Gone) => {
            // the push service disowned this endpoint; drop the stored entry
            state.subscriptions.remove(&user_id);
            SUBSCRIPTIONS.set(state.subscriptions.len() as f64);
            warn!(user_id = %user_id, "dropped subscription with gone endpoint");
            Err(ApiError::NotFound("Subscription is no longer valid"))
        }
        Err(PushError::Vapid(detail)) => {
            error!(error = %detail, "VAPID signing failed");
            Err(ApiError::Internal("Internal server error"))
        }
        Err(PushError::Delivery(detail)) => {
            error!(error = %detail, "push delivery failed");
            Err(ApiError::Unavailable(
                "Push delivery failed. Please try again.",
            ))
        }
    }
}

// No server-side medication schedule; reminders are evaluated in the
// client. The route always answers an empty set.
pub async fn check_reminders_handler() -> Json<Value> {
    Json(json!({ "reminders": [] }))
}

fn resolve_user_id(user_id: Option<String>, endpoint: Option<String>) -> Result<String, ApiError> {
    user_id
        .filter(|id| !id.is_empty())
        .or_else(|| {
            endpoint
                .filter(|e| !e.is_empty())
                .map(|e| derive_user_id(&e))
        })
        .ok_or_else(|| ApiError::BadRequest("userId or endpoint is required".to_string()))
}
