use axum::{body::Bytes, extract::State, http::HeaderMap};
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::webhook::{parse_event, WebhookError, WebhookEvent, WebhookVerifier, HEADER_ID, HEADER_SIGNATURE, HEADER_TIMESTAMP};

/// POST /clerk-webhook - user lifecycle deliveries from the auth provider
///
/// `user.created` and `user.updated` upsert the directory record; other
/// event types are acknowledged without effect.
pub async fn clerk_webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> ApiResult<Value> {
    let security = &state.config.security;
    let secret = security.webhook_secret.as_deref().ok_or(WebhookError::NotConfigured)?;
    let verifier = WebhookVerifier::new(secret, security.webhook_tolerance_secs)?;

    let msg_id = header(&headers, HEADER_ID)?;
    let timestamp = header(&headers, HEADER_TIMESTAMP)?;
    let signatures = header(&headers, HEADER_SIGNATURE)?;

    verifier.verify(msg_id, timestamp, signatures, &body, chrono::Utc::now().timestamp())?;

    match parse_event(&body)? {
        WebhookEvent::UserUpserted(profile) => {
            let user = state.services.users.upsert_from_webhook(profile).await?;
            tracing::info!("Webhook {} synced user {}", msg_id, user.external_id);
            Ok(ApiResponse::success(json!({ "handled": true, "user_id": user.id })))
        }
        WebhookEvent::Ignored(kind) => {
            tracing::debug!("Ignoring webhook event type {}", kind);
            Ok(ApiResponse::success(json!({ "handled": false, "type": kind })))
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, WebhookError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or(WebhookError::MissingHeader(name))
}
