use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::auth::{resolve_external_id, AuthContext};
use crate::middleware::bearer_token;
use crate::state::AppState;

/// GET /get-user-id - external id of the caller
///
/// A verified session wins; otherwise the token's `sub` claim is read without
/// checking its signature. The `Bearer ` scheme is optional here.
pub async fn get_user_id(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let auth = match bearer_token(&headers) {
        Ok(Some(token)) => match state.verifier.verify(&token).await {
            Ok(identity) => AuthContext::Session(identity),
            Err(e) => {
                tracing::debug!("Falling back to unverified token decode: {}", e);
                AuthContext::BearerToken(token)
            }
        },
        Ok(None) => AuthContext::Anonymous,
        Err(msg) => match unprefixed_token(&headers) {
            Some(raw) => AuthContext::BearerToken(raw),
            None => return unauthorized(&msg),
        },
    };

    match resolve_external_id(&auth) {
        Ok(Some(user_id)) => Json(json!({ "userId": user_id })).into_response(),
        Ok(None) => unauthorized("No user identity found"),
        Err(e) => unauthorized(&e.to_string()),
    }
}

/// A token sent as the whole Authorization value, without a scheme
fn unprefixed_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    if value.is_empty() || value.starts_with("Bearer") {
        return None;
    }
    Some(value.to_string())
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
}
