use axum::http::HeaderMap;
use axum::{Json, extract::State};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use super::analyze::{gate, map_upstream_error};
use crate::error::ApiError;
use crate::models::{MealType, MealsResponse};
use crate::parse::parse_meals;
use crate::state::AppState;

pub async fn meals_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<MealsResponse>, ApiError> {
    let client = gate(&state, "meals", &headers)?;

    let raw_type = body
        .get("mealType")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::BadRequest("mealType is required".to_string()))?;

    let meal_type = MealType::parse(raw_type).ok_or_else(|| {
        ApiError::BadRequest(
            "mealType must be one of breakfast, lunch, dinner, snacks".to_string(),
        )
    })?;

    let upstream = state.upstream.as_ref().ok_or(ApiError::Unavailable(
        "Meal recommendations are not configured on this server",
    ))?;

    info!(client = %client, meal_type = meal_type.as_str(), "generating meal ideas");

    let reply = upstream
        .meal_ideas(meal_type)
        .await
        .map_err(map_upstream_error)?;

    let meals = parse_meals(&reply).map_err(|e| {
        error!(error = %e, "model reply was not a parseable meal array");
        ApiError::Internal("Failed to generate meal ideas. Please try again.")
    })?;

    Ok(Json(MealsResponse { meals }))
}
