use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::AuthContext;
use crate::state::AppState;

/// Identity middleware: verifies the session token, if any, and injects an
/// `AuthContext` into the request. Never rejects; operations decide what an
/// anonymous caller may do.
pub async fn identity_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let auth = match bearer_token(request.headers()) {
        Ok(Some(token)) => match state.verifier.verify(&token).await {
            Ok(identity) => {
                tracing::debug!("Session verified for {:?}", identity.subject);
                AuthContext::Session(identity)
            }
            Err(e) => {
                tracing::warn!("Session token rejected: {}", e);
                AuthContext::Anonymous
            }
        },
        Ok(None) => AuthContext::Anonymous,
        Err(msg) => {
            tracing::warn!("{}", msg);
            AuthContext::Anonymous
        }
    };

    request.extensions_mut().insert(auth);
    next.run(request).await
}

/// Extract the bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, String> {
    let Some(auth_header) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if token.trim().is_empty() => Err("Empty bearer token".to_string()),
        Some(token) => Ok(Some(token.trim().to_string())),
        None => Err("Authorization header must use Bearer token format".to_string()),
    }
}
