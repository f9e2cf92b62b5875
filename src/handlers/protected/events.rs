use axum::{extract::State, Extension};

use crate::auth::AuthContext;
use crate::database::models::{EventRegistration, SocialEvent};
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson, ValidatedPath};
use crate::services::events::EventInput;
use crate::services::registration::RegistrationOutcome;
use crate::state::AppState;
use crate::types::Id;

/// GET /api/events
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<SocialEvent>> {
    let events = state.services.events.list().await?;
    Ok(ApiResponse::success(events))
}

/// GET /api/events/:id
pub async fn show(State(state): State<AppState>, ValidatedPath(id): ValidatedPath<Id<SocialEvent>>) -> ApiResult<SocialEvent> {
    let event = state.services.events.get(id).await?;
    Ok(ApiResponse::success(event))
}

/// POST /api/events - teacher only
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(input): ValidatedJson<EventInput>,
) -> ApiResult<SocialEvent> {
    let event = state.services.events.create(&auth, input).await?;
    Ok(ApiResponse::created(event))
}

/// PUT /api/events/:id - teacher only
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath(id): ValidatedPath<Id<SocialEvent>>,
    ValidatedJson(input): ValidatedJson<EventInput>,
) -> ApiResult<SocialEvent> {
    let event = state.services.events.update(&auth, id, input).await?;
    Ok(ApiResponse::success(event))
}

/// DELETE /api/events/:id - teacher only; drops registrations and comments too
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath(id): ValidatedPath<Id<SocialEvent>>,
) -> ApiResult<()> {
    state.services.events.delete(&auth, id).await?;
    Ok(ApiResponse::no_content())
}

/// POST /api/events/:id/registration
pub async fn toggle_registration(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath(id): ValidatedPath<Id<SocialEvent>>,
) -> ApiResult<RegistrationOutcome> {
    let outcome = state.services.events.toggle_registration(&auth, id).await?;
    Ok(ApiResponse::success(outcome))
}

/// GET /api/events/registrations
pub async fn my_registrations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Vec<EventRegistration>> {
    let registrations = state.services.events.my_registrations(&auth).await?;
    Ok(ApiResponse::success(registrations))
}
