use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service info
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Skolepoeng API",
            "version": version,
            "description": "School timetable, points and rewards backend",
            "environment": state.config.environment,
            "base_url": state.config.api.public_base_url,
            "auth": {
                "issuer": state.config.security.auth_issuer,
                "publishable_key": state.config.security.publishable_key,
            },
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "identity": "/get-user-id (public, bearer token)",
                "webhook": "/clerk-webhook (signed)",
                "users": "/api/users[/me|/leaderboard|/students|/:id/role|/:id/points]",
                "schedule": "/api/schedule[/setup|/today|/teacher|/day/:day|/:id/attend|/:id/registration|/:id/comments]",
                "events": "/api/events[/:id|/:id/registration|/:id/comments|/registrations]",
                "coupons": "/api/coupons[/:id|/:id/redeem|/redemptions]",
                "announcements": "/api/announcements[/:id]",
                "achievements": "/api/achievements[/setup]",
                "classes": "/api/classes[/:id/students|/:id/attendance], /api/attendance/me",
            }
        }
    }))
}
