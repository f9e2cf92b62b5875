use thiserror::Error;

use crate::auth::IdentityError;
use crate::database::StoreError;

/// Failures of domain operations
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Not authorized")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Not enough points: costs {needed}, balance is {available}")]
    InsufficientPoints { needed: i64, available: i64 },

    #[error("Coupon is no longer available")]
    CouponUnavailable,

    #[error("Event is full")]
    EventFull,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DomainError {
    pub fn invalid(message: impl Into<String>) -> Self {
        DomainError::InvalidInput(message.into())
    }

    /// Transaction conflicts are the only failures worth replaying
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Store(err) if err.is_conflict())
    }
}

impl From<IdentityError> for DomainError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidToken(reason) => DomainError::InvalidToken(reason.to_string()),
        }
    }
}
