pub mod auth;
pub mod authoring;
pub mod comments;
pub mod lessons;
pub mod middleware;
pub mod state;
pub mod views;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use middleware::{require_teacher, session_context, RequestContext};
use state::AppState;

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}

/// Builds the full browser-facing router.
pub fn router(state: Arc<AppState>) -> Router {
    // Teacher-only authoring routes
    let authoring_routes = Router::new()
        .route(
            "/create-lesson",
            get(authoring::create_lesson_page).post(authoring::create_lesson_handler),
        )
        .route("/create-lesson/panel", post(authoring::panel_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_teacher,
        ));

    let public_routes = Router::new()
        .route("/", get(lessons::home_page))
        .route("/login", get(auth::login_page).post(auth::login_handler))
        .route("/register", get(auth::register_page).post(auth::register_handler))
        .route("/logout", post(auth::logout_handler))
        .route("/profile", get(auth::profile_page))
        .route("/lessons", get(lessons::list_lessons))
        .route("/lessons/{id}", get(lessons::lesson_detail))
        .route("/lessons/{id}/like", post(lessons::like_lesson))
        .route("/lessons/{id}/delete", post(lessons::delete_lesson))
        .route("/lessons/{id}/comments", post(comments::create_comment))
        .route("/comments/{id}/like", post(comments::like_comment))
        .route("/comments/{id}/delete", post(comments::delete_comment))
        .route("/comments/{id}/edit", post(comments::edit_comment));

    Router::new()
        .merge(public_routes)
        .merge(authoring_routes)
        .layer(axum_middleware::from_fn_with_state(state.clone(), session_context))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
