use axum::{extract::State, Extension};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::auth::AuthContext;
use crate::database::models::{Attendance, Class, StudentInClass, User};
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson, ValidatedPath, ValidatedQuery};
use crate::services::classes::{AttendanceInput, ClassInput, ClassMember};
use crate::state::AppState;
use crate::types::Id;

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub student_id: Id<User>,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
    pub date: Option<NaiveDate>,
}

/// POST /api/classes - teacher only
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(input): ValidatedJson<ClassInput>,
) -> ApiResult<Class> {
    let class = state.services.classes.create(&auth, input).await?;
    Ok(ApiResponse::created(class))
}

/// GET /api/classes - taught classes for teachers, enrolled classes for students
pub async fn mine(State(state): State<AppState>, Extension(auth): Extension<AuthContext>) -> ApiResult<Vec<Class>> {
    let classes = state.services.classes.mine(&auth).await?;
    Ok(ApiResponse::success(classes))
}

/// GET /api/classes/:id/students
pub async fn students(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath(id): ValidatedPath<Id<Class>>,
) -> ApiResult<Vec<ClassMember>> {
    let members = state.services.classes.students(&auth, id).await?;
    Ok(ApiResponse::success(members))
}

/// POST /api/classes/:id/students
pub async fn add_student(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath(id): ValidatedPath<Id<Class>>,
    ValidatedJson(body): ValidatedJson<EnrollRequest>,
) -> ApiResult<StudentInClass> {
    let enrollment = state.services.classes.add_student(&auth, id, body.student_id).await?;
    Ok(ApiResponse::success(enrollment))
}

/// DELETE /api/classes/:id/students/:student_id
pub async fn remove_student(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath((id, student_id)): ValidatedPath<(Id<Class>, Id<User>)>,
) -> ApiResult<()> {
    state.services.classes.remove_student(&auth, id, student_id).await?;
    Ok(ApiResponse::no_content())
}

/// POST /api/classes/:id/attendance - upsert one student's status for a date
pub async fn mark_attendance(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath(id): ValidatedPath<Id<Class>>,
    ValidatedJson(input): ValidatedJson<AttendanceInput>,
) -> ApiResult<Attendance> {
    let record = state.services.classes.mark_attendance(&auth, id, input).await?;
    Ok(ApiResponse::success(record))
}

/// GET /api/classes/:id/attendance[?date=YYYY-MM-DD]
pub async fn attendance(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedPath(id): ValidatedPath<Id<Class>>,
    ValidatedQuery(query): ValidatedQuery<AttendanceQuery>,
) -> ApiResult<Vec<Attendance>> {
    let records = state.services.classes.attendance(&auth, id, query.date).await?;
    Ok(ApiResponse::success(records))
}

/// GET /api/attendance/me
pub async fn my_attendance(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Vec<Attendance>> {
    let records = state.services.classes.my_attendance(&auth).await?;
    Ok(ApiResponse::success(records))
}
