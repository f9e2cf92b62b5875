mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{json, Value};

use common::{TestApp, WEBHOOK_SECRET};
use skolepoeng::webhook::WebhookVerifier;

fn delivery(body: &Value, signature: Option<String>) -> Result<Request<Body>> {
    let timestamp = chrono::Utc::now().timestamp();
    let payload = body.to_string();
    let signature = match signature {
        Some(signature) => signature,
        None => WebhookVerifier::new(WEBHOOK_SECRET, 300)?.sign("msg_1", timestamp, payload.as_bytes())?,
    };

    Ok(Request::builder()
        .method(Method::POST)
        .uri("/clerk-webhook")
        .header("content-type", "application/json")
        .header("svix-id", "msg_1")
        .header("svix-timestamp", timestamp.to_string())
        .header("svix-signature", signature)
        .body(Body::from(payload))?)
}

fn user_created(external_id: &str) -> Value {
    json!({
        "type": "user.created",
        "data": {
            "id": external_id,
            "first_name": "Sofie",
            "last_name": "Berg",
            "image_url": "https://img.example.com/sofie.png",
            "primary_email_address_id": "idn_2",
            "email_addresses": [
                { "id": "idn_1", "email_address": "old@example.com" },
                { "id": "idn_2", "email_address": "sofie@example.com" }
            ]
        }
    })
}

async fn me(app: &TestApp, subject: &str) -> Result<(StatusCode, Value)> {
    app.get("/api/users/me", &app.token(subject)).await
}

#[tokio::test]
async fn signed_user_created_creates_the_student() -> Result<()> {
    let app = common::spawn_app();

    let (status, body) = app.send(delivery(&user_created("user_wh"), None)?).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["handled"], true);

    let (status, body) = me(&app, "user_wh").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Sofie Berg");
    assert_eq!(body["data"]["email"], "sofie@example.com");
    assert_eq!(body["data"]["role"], "student");
    assert_eq!(body["data"]["current_points"], 150);
    Ok(())
}

#[tokio::test]
async fn user_updated_keeps_points_and_role() -> Result<()> {
    let app = common::spawn_app();
    let teacher = app.sign_up("teacher_1", "Ingrid Hansen", "teacher").await?;
    app.send(delivery(&user_created("user_wh"), None)?).await?;

    let (_, body) = me(&app, "user_wh").await?;
    let id = body["data"]["id"].as_str().unwrap_or_default().to_string();
    app.post(&format!("/api/users/{}/points", id), &teacher, json!({ "amount": 40 }))
        .await?;

    let mut updated = user_created("user_wh");
    updated["type"] = json!("user.updated");
    updated["data"]["last_name"] = json!("Hansen");
    let (status, _) = app.send(delivery(&updated, None)?).await?;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = me(&app, "user_wh").await?;
    assert_eq!(body["data"]["name"], "Sofie Hansen");
    assert_eq!(body["data"]["current_points"], 190);
    assert_eq!(body["data"]["role"], "student");
    Ok(())
}

#[tokio::test]
async fn bad_signatures_are_rejected() -> Result<()> {
    let app = common::spawn_app();

    let (status, body) = app
        .send(delivery(&user_created("user_wh"), Some("v1,bm9wZQ==".to_string()))?)
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = me(&app, "user_wh").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let unsigned = Request::builder()
        .method(Method::POST)
        .uri("/clerk-webhook")
        .body(Body::from(user_created("user_wh").to_string()))?;
    let (status, _) = app.send(unsigned).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn other_event_types_are_acknowledged() -> Result<()> {
    let app = common::spawn_app();
    let event = json!({ "type": "session.created", "data": { "id": "sess_1" } });

    let (status, body) = app.send(delivery(&event, None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["handled"], false);
    assert_eq!(body["data"]["type"], "session.created");
    Ok(())
}

#[tokio::test]
async fn missing_secret_is_a_server_problem() -> Result<()> {
    let mut config = common::test_config();
    config.security.webhook_secret = None;
    let app = common::spawn_with(config);

    let (status, body) = app.send(delivery(&user_created("user_wh"), None)?).await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    Ok(())
}
