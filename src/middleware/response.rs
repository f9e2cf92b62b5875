use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::error::ApiError;

#[derive(Serialize)]
struct Envelope<T> {
    success: bool,
    data: T,
}

/// Handler output wrapped as `{ "success": true, "data": ... }`
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::with_status(data, StatusCode::OK)
    }

    pub fn created(data: T) -> Self {
        Self::with_status(data, StatusCode::CREATED)
    }

    pub fn with_status(data: T, status: StatusCode) -> Self {
        Self { status, data: Some(data) }
    }
}

impl ApiResponse<()> {
    /// 204 with an empty body
    pub fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self.data {
            Some(data) => (self.status, Json(Envelope { success: true, data })).into_response(),
            None => self.status.into_response(),
        }
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;
