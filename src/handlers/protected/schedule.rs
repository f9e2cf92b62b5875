use axum::{extract::State, Extension};
use serde_json::{json, Value};

use crate::auth::AuthContext;
use crate::database::models::ScheduleItem;
use crate::middleware::{ApiResponse, ApiResult, ValidatedPath};
use crate::services::registration::RegistrationOutcome;
use crate::services::schedule::{AttendanceOutcome, DaySchedule};
use crate::state::AppState;
use crate::types::Id;

/// GET /api/schedule - the caller's whole week
pub async fn my_schedule(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Vec<ScheduleItem>> {
    let items = state.services.schedule.my_schedule(&auth).await?;
    Ok(ApiResponse::success(items))
}

/// GET /api/schedule/day/:day - `day` is a Norwegian weekday name
pub async fn for_day(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath(day): ValidatedPath<String>,
) -> ApiResult<DaySchedule> {
    let schedule = state.services.schedule.schedule_for_day(&auth, &day).await?;
    Ok(ApiResponse::success(schedule))
}

/// GET /api/schedule/today
pub async fn today(State(state): State<AppState>, Extension(auth): Extension<AuthContext>) -> ApiResult<DaySchedule> {
    let schedule = state.services.schedule.today(&auth).await?;
    Ok(ApiResponse::success(schedule))
}

/// POST /api/schedule/setup - replace the caller's week with the template
pub async fn setup(State(state): State<AppState>, Extension(auth): Extension<AuthContext>) -> ApiResult<Value> {
    let inserted = state.services.schedule.setup(&auth).await?;
    Ok(ApiResponse::created(json!({ "inserted": inserted })))
}

/// POST /api/schedule/:id/attend
pub async fn mark_attended(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath(id): ValidatedPath<Id<ScheduleItem>>,
) -> ApiResult<AttendanceOutcome> {
    let outcome = state.services.schedule.mark_attended(&auth, id).await?;
    Ok(ApiResponse::success(outcome))
}

/// POST /api/schedule/:id/registration - toggle sign-up for an event or trip
pub async fn toggle_registration(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath(id): ValidatedPath<Id<ScheduleItem>>,
) -> ApiResult<RegistrationOutcome> {
    let outcome = state.services.schedule.toggle_registration(&auth, id).await?;
    Ok(ApiResponse::success(outcome))
}

/// GET /api/schedule/teacher - lessons taught by the caller
pub async fn teacher_schedule(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Vec<ScheduleItem>> {
    let items = state.services.schedule.teacher_schedule(&auth).await?;
    Ok(ApiResponse::success(items))
}
