use axum::{extract::State, Extension};
use serde::Deserialize;

use crate::auth::AuthContext;
use crate::database::models::{EventComment, ScheduleItem, SocialEvent};
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson, ValidatedPath};
use crate::state::AppState;
use crate::types::{EventRef, Id};

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub message: String,
}

/// GET /api/events/:id/comments
pub async fn list_for_event(
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<Id<SocialEvent>>,
) -> ApiResult<Vec<EventComment>> {
    let comments = state.services.comments.list(EventRef::SocialEvent(id)).await?;
    Ok(ApiResponse::success(comments))
}

/// POST /api/events/:id/comments
pub async fn add_to_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath(id): ValidatedPath<Id<SocialEvent>>,
    ValidatedJson(body): ValidatedJson<CommentRequest>,
) -> ApiResult<EventComment> {
    let comment = state
        .services
        .comments
        .add(&auth, EventRef::SocialEvent(id), &body.message)
        .await?;
    Ok(ApiResponse::created(comment))
}

/// GET /api/schedule/:id/comments
pub async fn list_for_item(
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<Id<ScheduleItem>>,
) -> ApiResult<Vec<EventComment>> {
    let comments = state.services.comments.list(EventRef::ScheduleItem(id)).await?;
    Ok(ApiResponse::success(comments))
}

/// POST /api/schedule/:id/comments
pub async fn add_to_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath(id): ValidatedPath<Id<ScheduleItem>>,
    ValidatedJson(body): ValidatedJson<CommentRequest>,
) -> ApiResult<EventComment> {
    let comment = state
        .services
        .comments
        .add(&auth, EventRef::ScheduleItem(id), &body.message)
        .await?;
    Ok(ApiResponse::created(comment))
}

/// DELETE /api/comments/:id - author only
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath(id): ValidatedPath<Id<EventComment>>,
) -> ApiResult<()> {
    state.services.comments.delete(&auth, id).await?;
    Ok(ApiResponse::no_content())
}
