pub mod guard;
pub mod resolver;
pub mod verifier;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

pub use guard::{require_owner, require_teacher, require_user};
pub use resolver::{resolve_external_id, IdentityError};
pub use verifier::{TokenVerifier, VerifyError};

/// Verified caller identity, as produced by session token verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// `sub` claim
    pub subject: Option<String>,
    /// Composite `issuer|user_id` identifier
    pub token_identifier: String,
    pub issuer: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// What a request knows about its caller.
///
/// API routes only ever see `Session` or `Anonymous`; `BearerToken` carries
/// an unverified token for plain HTTP handlers that decode it themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthContext {
    Session(Identity),
    BearerToken(String),
    Anonymous,
}

/// Claims for locally minted development tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct DevClaims {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl DevClaims {
    pub fn new(sub: impl Into<String>, expiry_hours: u64) -> Self {
        let issued = Utc::now();

        Self {
            sub: sub.into(),
            iss: None,
            aud: None,
            email: None,
            name: None,
            exp: (issued + Duration::hours(expiry_hours as i64)).timestamp(),
            iat: issued.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("cannot sign a token with an empty secret")]
    EmptySecret,
    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Sign an HS256 session token with the shared development secret
pub fn generate_jwt(claims: &DevClaims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::EmptySecret);
    }

    Ok(encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(secret.as_bytes()))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_secret() {
        let claims = DevClaims::new("user_1", 1);
        assert!(matches!(generate_jwt(&claims, ""), Err(JwtError::EmptySecret)));
    }

    #[test]
    fn mints_three_segment_token() {
        let claims = DevClaims::new("user_1", 1);
        let token = generate_jwt(&claims, "secret").unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert!(claims.exp > claims.iat);
    }
}
