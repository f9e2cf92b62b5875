use axum::{extract::State, Extension};
use serde::Deserialize;

use crate::auth::AuthContext;
use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson, ValidatedPath};
use crate::services::directory::{LeaderboardEntry, StoreUserRequest};
use crate::state::AppState;
use crate::types::{Id, Role};

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct PointsRequest {
    pub amount: i64,
}

/// POST /api/users - create or refresh the caller's record
pub async fn store_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(request): ValidatedJson<StoreUserRequest>,
) -> ApiResult<User> {
    let user = state.services.users.store_user(&auth, request).await?;
    Ok(ApiResponse::success(user))
}

/// GET /api/users/me
pub async fn current_user(State(state): State<AppState>, Extension(auth): Extension<AuthContext>) -> ApiResult<User> {
    let user = state.services.users.current_user(&auth).await?;
    Ok(ApiResponse::success(user))
}

/// PUT /api/users/me/role - onboarding role choice, allowed once
pub async fn choose_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(body): ValidatedJson<RoleRequest>,
) -> ApiResult<User> {
    let user = state.services.users.choose_role(&auth, body.role).await?;
    Ok(ApiResponse::success(user))
}

/// GET /api/users/leaderboard
pub async fn leaderboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Vec<LeaderboardEntry>> {
    let entries = state.services.users.leaderboard(&auth).await?;
    Ok(ApiResponse::success(entries))
}

/// GET /api/users/students - teacher only
pub async fn list_students(State(state): State<AppState>, Extension(auth): Extension<AuthContext>) -> ApiResult<Vec<User>> {
    let students = state.services.users.list_students(&auth).await?;
    Ok(ApiResponse::success(students))
}

/// PUT /api/users/:id/role - teacher only
pub async fn assign_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath(id): ValidatedPath<Id<User>>,
    ValidatedJson(body): ValidatedJson<RoleRequest>,
) -> ApiResult<User> {
    let user = state.services.users.assign_role(&auth, id, body.role).await?;
    Ok(ApiResponse::success(user))
}

/// POST /api/users/:id/points - teacher only
pub async fn award_points(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath(id): ValidatedPath<Id<User>>,
    ValidatedJson(body): ValidatedJson<PointsRequest>,
) -> ApiResult<User> {
    let user = state.services.users.award_points(&auth, id, body.amount).await?;
    Ok(ApiResponse::success(user))
}
