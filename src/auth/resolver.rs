use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::{AuthContext, Identity};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("Invalid token: {0}")]
    InvalidToken(&'static str),
}

/// Resolve the caller's external user id.
///
/// `Ok(None)` means no identity could be determined; callers decide whether
/// that is fatal.
pub fn resolve_external_id(auth: &AuthContext) -> Result<Option<String>, IdentityError> {
    let resolved = match auth {
        AuthContext::Session(identity) => session_external_id(identity),
        AuthContext::BearerToken(header) => subject_from_unverified(header)?,
        AuthContext::Anonymous => None,
    };

    if resolved.is_none() {
        match auth {
            AuthContext::Anonymous => {
                warn!("No identity on request; is the Authorization header set and the token verifiable?")
            }
            _ => warn!("Token carried no usable user id; check the auth provider's token template"),
        }
    }

    Ok(resolved)
}

/// Prefer `sub`; otherwise take what follows the last `|` of the token
/// identifier.
fn session_external_id(identity: &Identity) -> Option<String> {
    if let Some(subject) = identity.subject.as_deref().filter(|s| !s.is_empty()) {
        return Some(subject.to_string());
    }

    identity
        .token_identifier
        .rsplit('|')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Read `sub` out of a JWT payload without verifying the signature.
///
/// Only for handlers that run where the platform already validated the token,
/// or that accept the risk (e.g. `/get-user-id`).
pub fn subject_from_unverified(header: &str) -> Result<Option<String>, IdentityError> {
    let token = header.trim();
    let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        warn!("Bearer token has {} segments, expected 3", segments.len());
        return Err(IdentityError::InvalidToken("expected three dot-separated segments"));
    }

    let payload = URL_SAFE_NO_PAD
        .decode(segments[1].trim_end_matches('='))
        .map_err(|_| IdentityError::InvalidToken("payload is not base64url"))?;

    let claims: Value = serde_json::from_slice(&payload)
        .map_err(|_| IdentityError::InvalidToken("payload is not JSON"))?;

    Ok(claims.get("sub").and_then(Value::as_str).map(str::to_string))
}
