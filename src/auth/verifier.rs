use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use super::Identity;
use crate::config::SecurityConfig;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("no session key configured")]
    NotConfigured,

    #[error("invalid session token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("session token has no key id")]
    MissingKeyId,

    #[error("unknown signing key: {0}")]
    UnknownKey(String),

    #[error("invalid JWKS url: {0}")]
    JwksUrl(#[from] url::ParseError),

    #[error("failed to fetch JWKS: {0}")]
    Jwks(#[from] reqwest::Error),
}

/// Claims read from a verified session token
#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: Option<String>,
    iss: Option<String>,
    email: Option<String>,
    name: Option<String>,
}

enum KeySource {
    /// HS256 with a shared secret
    Shared(DecodingKey),
    /// RS256 with keys published by the auth provider
    Jwks {
        url: Url,
        client: reqwest::Client,
        keys: RwLock<JwkSet>,
    },
    Disabled,
}

/// Verifies session tokens on inbound API requests
pub struct TokenVerifier {
    source: KeySource,
    issuer: Option<String>,
    audience: Option<String>,
}

impl TokenVerifier {
    /// Pick a key source: shared secret first, then the configured JWKS url,
    /// then `<issuer>/.well-known/jwks.json`.
    pub fn from_config(security: &SecurityConfig) -> Result<Self, VerifyError> {
        let source = if let Some(secret) = security.jwt_secret.as_deref() {
            info!("Session tokens verified with shared HS256 secret");
            KeySource::Shared(DecodingKey::from_secret(secret.as_bytes()))
        } else if let Some(url) = jwks_url(security)? {
            info!("Session tokens verified against JWKS at {}", url);
            KeySource::Jwks {
                url,
                client: reqwest::Client::new(),
                keys: RwLock::new(JwkSet { keys: Vec::new() }),
            }
        } else {
            warn!("No AUTH_JWT_SECRET, AUTH_JWKS_URL or AUTH_ISSUER set; every API request will be anonymous");
            KeySource::Disabled
        };

        Ok(Self {
            source,
            issuer: security.auth_issuer.clone(),
            audience: security.auth_audience.clone(),
        })
    }

    pub fn shared_secret(secret: &str, issuer: Option<String>, audience: Option<String>) -> Self {
        Self {
            source: KeySource::Shared(DecodingKey::from_secret(secret.as_bytes())),
            issuer,
            audience,
        }
    }

    pub async fn verify(&self, token: &str) -> Result<Identity, VerifyError> {
        let (key, algorithm) = match &self.source {
            KeySource::Shared(key) => (key.clone(), Algorithm::HS256),
            KeySource::Jwks { .. } => (self.jwks_key(token).await?, Algorithm::RS256),
            KeySource::Disabled => return Err(VerifyError::NotConfigured),
        };

        let mut validation = Validation::new(algorithm);
        match &self.issuer {
            Some(issuer) => validation.set_issuer(&[issuer]),
            None => validation.iss = None,
        }
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| {
            if matches!(e.kind(), ErrorKind::InvalidAudience | ErrorKind::MissingRequiredClaim(_)) {
                warn!("Session token audience mismatch; the provider's JWT template must set aud to {:?}", self.audience);
            }
            VerifyError::from(e)
        })?;

        let claims = data.claims;
        let token_identifier = format!(
            "{}|{}",
            claims.iss.as_deref().unwrap_or_default(),
            claims.sub.as_deref().unwrap_or_default()
        );

        Ok(Identity {
            subject: claims.sub.filter(|s| !s.is_empty()),
            token_identifier,
            issuer: claims.iss,
            email: claims.email,
            name: claims.name,
        })
    }

    /// Find the token's signing key, refetching the key set once on a miss
    async fn jwks_key(&self, token: &str) -> Result<DecodingKey, VerifyError> {
        let KeySource::Jwks { url, client, keys } = &self.source else {
            return Err(VerifyError::NotConfigured);
        };

        let kid = decode_header(token)?.kid.ok_or(VerifyError::MissingKeyId)?;

        if let Some(jwk) = keys.read().await.find(&kid) {
            return Ok(DecodingKey::from_jwk(jwk)?);
        }

        debug!("Signing key {} not cached, fetching {}", kid, url);
        let fresh: JwkSet = client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut cached = keys.write().await;
        *cached = fresh;
        let jwk = cached.find(&kid).ok_or_else(|| VerifyError::UnknownKey(kid.clone()))?;
        Ok(DecodingKey::from_jwk(jwk)?)
    }
}

fn jwks_url(security: &SecurityConfig) -> Result<Option<Url>, VerifyError> {
    if let Some(url) = security.jwks_url.as_deref() {
        return Ok(Some(Url::parse(url)?));
    }
    match security.auth_issuer.as_deref() {
        Some(issuer) => {
            let base = format!("{}/", issuer.trim_end_matches('/'));
            Ok(Some(Url::parse(&base)?.join(".well-known/jwks.json")?))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{generate_jwt, DevClaims};
    use crate::config::AppConfig;

    #[tokio::test]
    async fn verifies_shared_secret_token() {
        let verifier = TokenVerifier::shared_secret("secret", None, None);
        let mut claims = DevClaims::new("user_42", 1);
        claims.iss = Some("https://issuer.test".to_string());
        claims.email = Some("kari@example.com".to_string());
        let token = generate_jwt(&claims, "secret").unwrap();

        let identity = verifier.verify(&token).await.unwrap();
        assert_eq!(identity.subject.as_deref(), Some("user_42"));
        assert_eq!(identity.token_identifier, "https://issuer.test|user_42");
        assert_eq!(identity.email.as_deref(), Some("kari@example.com"));
    }

    #[tokio::test]
    async fn rejects_wrong_secret() {
        let verifier = TokenVerifier::shared_secret("secret", None, None);
        let token = generate_jwt(&DevClaims::new("user_42", 1), "other").unwrap();
        assert!(matches!(verifier.verify(&token).await, Err(VerifyError::Invalid(_))));
    }

    #[tokio::test]
    async fn enforces_issuer_and_audience() {
        let verifier = TokenVerifier::shared_secret(
            "secret",
            Some("https://issuer.test".to_string()),
            Some("convex".to_string()),
        );

        let mut claims = DevClaims::new("user_42", 1);
        claims.iss = Some("https://issuer.test".to_string());
        let no_aud = generate_jwt(&claims, "secret").unwrap();
        assert!(verifier.verify(&no_aud).await.is_err());

        claims.aud = Some("convex".to_string());
        let good = generate_jwt(&claims, "secret").unwrap();
        assert!(verifier.verify(&good).await.is_ok());

        claims.iss = Some("https://elsewhere.test".to_string());
        let wrong_iss = generate_jwt(&claims, "secret").unwrap();
        assert!(verifier.verify(&wrong_iss).await.is_err());
    }

    #[tokio::test]
    async fn disabled_verifier_rejects_everything() {
        let verifier = TokenVerifier::from_config(&AppConfig::development().security).unwrap();
        let token = generate_jwt(&DevClaims::new("user_42", 1), "secret").unwrap();
        assert!(matches!(verifier.verify(&token).await, Err(VerifyError::NotConfigured)));
    }

    #[test]
    fn derives_jwks_url_from_issuer() {
        let mut security = AppConfig::development().security;
        security.auth_issuer = Some("https://clerk.example.com/".to_string());
        let url = jwks_url(&security).unwrap().unwrap();
        assert_eq!(url.as_str(), "https://clerk.example.com/.well-known/jwks.json");

        security.jwks_url = Some("https://keys.example.com/jwks".to_string());
        let url = jwks_url(&security).unwrap().unwrap();
        assert_eq!(url.as_str(), "https://keys.example.com/jwks");
    }
}
