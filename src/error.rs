use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::StoreError;
use crate::services::DomainError;
use crate::webhook::WebhookError;

/// Error returned by handlers, rendered as `{ success: false, error, code }`
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Validation(String),
    InvalidJson(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    UserNotFound(String),
    Conflict(String),
    /// A domain rule refused the operation (points, stock, capacity)
    Precondition { code: &'static str, message: String },
    Internal(String),
    Unavailable(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        use ApiError::*;
        match self {
            BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            InvalidJson(_) => (StatusCode::BAD_REQUEST, "INVALID_JSON"),
            Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            UserNotFound(_) => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Precondition { code, .. } => (StatusCode::CONFLICT, *code),
            Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR"),
            Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_and_code().0.as_u16()
    }

    pub fn error_code(&self) -> &'static str {
        self.status_and_code().1
    }

    pub fn message(&self) -> &str {
        use ApiError::*;
        match self {
            BadRequest(m) | Validation(m) | InvalidJson(m) | Unauthorized(m) | Forbidden(m) | NotFound(m)
            | UserNotFound(m) | Conflict(m) | Internal(m) | Unavailable(m) => m,
            Precondition { message, .. } => message,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code(),
        })
    }

    fn precondition(code: &'static str, err: DomainError) -> Self {
        ApiError::Precondition {
            code,
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Unauthenticated | DomainError::InvalidToken(_) => ApiError::Unauthorized(err.to_string()),
            DomainError::UserNotFound => ApiError::UserNotFound(err.to_string()),
            DomainError::Unauthorized => ApiError::Forbidden(err.to_string()),
            DomainError::NotFound(_) => ApiError::NotFound(err.to_string()),
            DomainError::InvalidInput(msg) => ApiError::Validation(msg),
            DomainError::InsufficientPoints { .. } => ApiError::precondition("INSUFFICIENT_POINTS", err),
            DomainError::CouponUnavailable => ApiError::precondition("COUPON_UNAVAILABLE", err),
            DomainError::EventFull => ApiError::precondition("EVENT_FULL", err),
            DomainError::Store(store) => store.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => {
                tracing::warn!("Transaction conflict after retries: {}", msg);
                ApiError::Conflict("The record was changed by another request, please try again".into())
            }
            StoreError::ConfigMissing(_) => {
                tracing::error!("Store misconfigured: {}", err);
                ApiError::Unavailable("Database temporarily unavailable".into())
            }
            StoreError::Sqlx(sqlx::Error::PoolTimedOut) | StoreError::Sqlx(sqlx::Error::Io(_)) => {
                tracing::error!("Database unavailable: {}", err);
                ApiError::Unavailable("Database temporarily unavailable".into())
            }
            other => {
                tracing::error!("Store error: {}", other);
                ApiError::Internal("Database error occurred".into())
            }
        }
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::NotConfigured => {
                tracing::error!("Webhook delivery received but CLERK_WEBHOOK_SECRET is not set");
                ApiError::Unavailable("Webhook endpoint is not configured".into())
            }
            other => {
                tracing::warn!("Rejected webhook delivery: {}", other);
                ApiError::BadRequest(other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => ApiError::Validation(e.body_text()),
            JsonRejection::JsonSyntaxError(e) => ApiError::InvalidJson(e.body_text()),
            JsonRejection::MissingJsonContentType(e) => ApiError::BadRequest(e.body_text()),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, _) = self.status_and_code();
        (status, Json(self.to_json())).into_response()
    }
}
