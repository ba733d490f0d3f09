use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/reset", post(handlers::request_password_reset))
        .route("/api/auth/reset/confirm", post(handlers::confirm_password_reset))
        .route("/api/auth/profile", post(handlers::update_display_name))
        .route("/api/session", post(handlers::start_session))
        .route("/api/profile", get(handlers::get_profile))
        .route("/api/exercises", post(handlers::add_exercise))
        .route("/api/exercises/target", post(handlers::retarget_exercise))
        .route("/api/progress", post(handlers::log_progress))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/history", get(handlers::get_history))
        .route("/api/leaderboard", get(handlers::get_leaderboard))
        .route("/api/friends", get(handlers::list_friends).post(handlers::add_friend))
        .route("/api/settings", post(handlers::update_settings))
        .route("/api/quote", get(handlers::get_quote))
        .with_state(state)
}
