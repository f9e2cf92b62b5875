#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use skolepoeng::auth::{generate_jwt, DevClaims, TokenVerifier};
use skolepoeng::config::AppConfig;
use skolepoeng::database::MemoryDocumentStore;
use skolepoeng::{app, AppState};

pub const JWT_SECRET: &str = "integration-test-secret";
// base64("test-webhook-secret")
pub const WEBHOOK_SECRET: &str = "whsec_dGVzdC13ZWJob29rLXNlY3JldA==";

/// In-process app on the memory store
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.database.url = None;
    config.api.enable_request_logging = false;
    config.security.cors_origins = vec!["*".to_string()];
    config.security.jwt_secret = Some(JWT_SECRET.to_string());
    config.security.webhook_secret = Some(WEBHOOK_SECRET.to_string());
    config
}

pub fn spawn_app() -> TestApp {
    spawn_with(test_config())
}

pub fn spawn_with(config: AppConfig) -> TestApp {
    let verifier = TokenVerifier::from_config(&config.security).expect("verifier");
    let state = AppState::new(Arc::new(MemoryDocumentStore::new()), verifier, config);
    TestApp {
        router: app(state.clone()),
        state,
    }
}

impl TestApp {
    /// Session token for an external user id
    pub fn token(&self, subject: &str) -> String {
        generate_jwt(&DevClaims::new(subject, 1), JWT_SECRET).expect("token")
    }

    pub async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await.context("request failed")?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("response was not JSON")?
        };
        Ok((status, body))
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    /// Create a user through the client sign-up fallback and return its token
    pub async fn sign_up(&self, subject: &str, name: &str, role: &str) -> Result<String> {
        let token = self.token(subject);
        let (status, body) = self
            .post(
                "/api/users",
                &token,
                json!({
                    "name": name,
                    "email": format!("{}@example.com", subject),
                    "grade": "10A",
                    "role": role
                }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "sign up failed: {} {}", status, body);
        Ok(token)
    }

    pub async fn user_id(&self, token: &str) -> Result<String> {
        let (_, body) = self.get("/api/users/me", token).await?;
        body["data"]["id"]
            .as_str()
            .map(str::to_string)
            .context("user has no id")
    }
}
