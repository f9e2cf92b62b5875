use axum::{extract::State, Extension};

use crate::auth::AuthContext;
use crate::database::models::Announcement;
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson, ValidatedPath};
use crate::services::announcements::AnnouncementInput;
use crate::state::AppState;
use crate::types::Id;

/// GET /api/announcements - newest first
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Announcement>> {
    let announcements = state.services.announcements.list().await?;
    Ok(ApiResponse::success(announcements))
}

/// POST /api/announcements - teacher only
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(input): ValidatedJson<AnnouncementInput>,
) -> ApiResult<Announcement> {
    let announcement = state.services.announcements.create(&auth, input).await?;
    Ok(ApiResponse::created(announcement))
}

/// PUT /api/announcements/:id - the teacher who posted it
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath(id): ValidatedPath<Id<Announcement>>,
    ValidatedJson(input): ValidatedJson<AnnouncementInput>,
) -> ApiResult<Announcement> {
    let announcement = state.services.announcements.update(&auth, id, input).await?;
    Ok(ApiResponse::success(announcement))
}

/// DELETE /api/announcements/:id - the teacher who posted it
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath(id): ValidatedPath<Id<Announcement>>,
) -> ApiResult<()> {
    state.services.announcements.delete(&auth, id).await?;
    Ok(ApiResponse::no_content())
}
