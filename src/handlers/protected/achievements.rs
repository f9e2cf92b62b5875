use axum::{extract::State, Extension};
use serde_json::{json, Value};

use crate::auth::AuthContext;
use crate::database::models::Achievement;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/achievements
pub async fn mine(State(state): State<AppState>, Extension(auth): Extension<AuthContext>) -> ApiResult<Vec<Achievement>> {
    let achievements = state.services.achievements.mine(&auth).await?;
    Ok(ApiResponse::success(achievements))
}

/// POST /api/achievements/setup - idempotent
pub async fn setup(State(state): State<AppState>, Extension(auth): Extension<AuthContext>) -> ApiResult<Value> {
    let inserted = state.services.achievements.setup(&auth).await?;
    Ok(ApiResponse::success(json!({ "inserted": inserted })))
}
