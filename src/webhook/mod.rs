//! Auth provider webhooks: signature verification and user payloads

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use crate::services::directory::ExternalProfile;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook secret not configured")]
    NotConfigured,

    #[error("missing {0} header")]
    MissingHeader(&'static str),

    #[error("webhook secret is not valid base64")]
    InvalidSecret,

    #[error("invalid webhook timestamp")]
    InvalidTimestamp,

    #[error("webhook timestamp outside tolerance")]
    Expired,

    #[error("no matching webhook signature")]
    InvalidSignature,

    #[error("invalid webhook payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Verifies `svix-signature` headers: base64 HMAC-SHA256 of
/// `{id}.{timestamp}.{body}` keyed with the decoded `whsec_` secret.
pub struct WebhookVerifier {
    key: Vec<u8>,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    pub fn new(secret: &str, tolerance_secs: i64) -> Result<Self, WebhookError> {
        let encoded = secret.strip_prefix("whsec_").unwrap_or(secret);
        let key = STANDARD.decode(encoded).map_err(|_| WebhookError::InvalidSecret)?;
        Ok(Self { key, tolerance_secs })
    }

    fn mac(&self, msg_id: &str, timestamp: &str, body: &[u8]) -> Result<HmacSha256, WebhookError> {
        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|_| WebhookError::InvalidSecret)?;
        mac.update(msg_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(mac)
    }

    /// Signature header value for a delivery, as the sender computes it
    pub fn sign(&self, msg_id: &str, timestamp: i64, body: &[u8]) -> Result<String, WebhookError> {
        let mac = self.mac(msg_id, &timestamp.to_string(), body)?;
        Ok(format!("v1,{}", STANDARD.encode(mac.finalize().into_bytes())))
    }

    /// Check a delivery. `signatures` is the space-separated header value;
    /// any one matching `v1` entry is enough.
    pub fn verify(&self, msg_id: &str, timestamp: &str, signatures: &str, body: &[u8], now: i64) -> Result<(), WebhookError> {
        let sent_at: i64 = timestamp.trim().parse().map_err(|_| WebhookError::InvalidTimestamp)?;
        if (now - sent_at).abs() > self.tolerance_secs {
            return Err(WebhookError::Expired);
        }

        let mac = self.mac(msg_id, timestamp.trim(), body)?;
        let matched = signatures
            .split_whitespace()
            .filter_map(|entry| entry.strip_prefix("v1,"))
            .filter_map(|encoded| STANDARD.decode(encoded).ok())
            .any(|signature| mac.clone().verify_slice(&signature).is_ok());

        if matched {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature)
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ClerkUser {
    id: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    primary_email_address_id: Option<String>,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    id: String,
    email_address: String,
}

impl ClerkUser {
    fn primary_email(&self) -> String {
        let primary = self
            .email_addresses
            .iter()
            .find(|e| Some(&e.id) == self.primary_email_address_id.as_ref())
            .or_else(|| self.email_addresses.first());
        primary.map(|e| e.email_address.clone()).unwrap_or_default()
    }

    fn display_name(&self, email: &str) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }
        if let Some(username) = self.username.as_deref().filter(|s| !s.is_empty()) {
            return username.to_string();
        }
        match email.split('@').next().filter(|s| !s.is_empty()) {
            Some(local) => local.to_string(),
            None => "Unknown".to_string(),
        }
    }

    fn into_profile(self) -> ExternalProfile {
        let email = self.primary_email();
        let name = self.display_name(&email);
        ExternalProfile {
            external_id: self.id,
            name,
            email,
            image_url: self.image_url,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum WebhookEvent {
    UserUpserted(ExternalProfile),
    /// Event type this backend does not handle
    Ignored(String),
}

pub fn parse_event(body: &[u8]) -> Result<WebhookEvent, WebhookError> {
    let envelope: Envelope = serde_json::from_slice(body)?;
    match envelope.kind.as_str() {
        "user.created" | "user.updated" => {
            let user: ClerkUser = serde_json::from_value(envelope.data)?;
            Ok(WebhookEvent::UserUpserted(user.into_profile()))
        }
        _ => Ok(WebhookEvent::Ignored(envelope.kind)),
    }
}
