use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{protected, public};
use crate::middleware::identity_middleware;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(user_routes())
        .merge(schedule_routes())
        .merge(event_routes())
        .merge(coupon_routes())
        .merge(announcement_routes())
        .merge(achievement_routes())
        .merge(class_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), identity_middleware));

    let router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/get-user-id", get(public::get_user_id))
        .route("/clerk-webhook", post(public::clerk_webhook))
        // Identity-aware API
        .nest("/api", api)
        // Global middleware
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes))
        .layer(cors_layer(&state.config.security));

    let router = if state.config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    Router::new()
        .route("/users", post(users::store_user))
        .route("/users/me", get(users::current_user))
        .route("/users/me/role", put(users::choose_role))
        .route("/users/leaderboard", get(users::leaderboard))
        .route("/users/students", get(users::list_students))
        .route("/users/:id/role", put(users::assign_role))
        .route("/users/:id/points", post(users::award_points))
}

fn schedule_routes() -> Router<AppState> {
    use protected::{comments, schedule};

    Router::new()
        .route("/schedule", get(schedule::my_schedule))
        .route("/schedule/setup", post(schedule::setup))
        .route("/schedule/today", get(schedule::today))
        .route("/schedule/teacher", get(schedule::teacher_schedule))
        .route("/schedule/day/:day", get(schedule::for_day))
        .route("/schedule/:id/attend", post(schedule::mark_attended))
        .route("/schedule/:id/registration", post(schedule::toggle_registration))
        .route(
            "/schedule/:id/comments",
            get(comments::list_for_item).post(comments::add_to_item),
        )
}

fn event_routes() -> Router<AppState> {
    use protected::{comments, events};

    Router::new()
        .route("/events", get(events::list).post(events::create))
        .route("/events/registrations", get(events::my_registrations))
        .route(
            "/events/:id",
            get(events::show).put(events::update).delete(events::delete),
        )
        .route("/events/:id/registration", post(events::toggle_registration))
        .route(
            "/events/:id/comments",
            get(comments::list_for_event).post(comments::add_to_event),
        )
        .route("/comments/:id", delete(comments::delete))
}

fn coupon_routes() -> Router<AppState> {
    use protected::coupons;

    Router::new()
        .route("/coupons", get(coupons::list).post(coupons::create))
        .route("/coupons/redemptions", get(coupons::my_redemptions))
        .route("/coupons/:id", put(coupons::update).delete(coupons::delete))
        .route("/coupons/:id/redeem", post(coupons::redeem))
}

fn announcement_routes() -> Router<AppState> {
    use protected::announcements;

    Router::new()
        .route(
            "/announcements",
            get(announcements::list).post(announcements::create),
        )
        .route(
            "/announcements/:id",
            put(announcements::update).delete(announcements::delete),
        )
}

fn achievement_routes() -> Router<AppState> {
    use protected::achievements;

    Router::new()
        .route("/achievements", get(achievements::mine))
        .route("/achievements/setup", post(achievements::setup))
}

fn class_routes() -> Router<AppState> {
    use protected::classes;

    Router::new()
        .route("/classes", get(classes::mine).post(classes::create))
        .route(
            "/classes/:id/students",
            get(classes::students).post(classes::add_student),
        )
        .route(
            "/classes/:id/students/:student_id",
            delete(classes::remove_student),
        )
        .route(
            "/classes/:id/attendance",
            get(classes::attendance).post(classes::mark_attendance),
        )
        .route("/attendance/me", get(classes::my_attendance))
}
