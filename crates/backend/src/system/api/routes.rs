use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use super::handlers;
use crate::system::auth;

/// Auth and user management routes
pub fn configure_system_routes() -> Router {
    Router::new()
        // ========================================
        // HEALTH CHECK
        // ========================================
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // AUTH ROUTES (PUBLIC)
        // ========================================
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .route("/api/auth/logout", post(handlers::auth::logout))
        // Auth routes (protected)
        .route(
            "/api/auth/me",
            get(handlers::auth::current_user)
                .layer(middleware::from_fn(auth::middleware::require_auth)),
        )
        // ========================================
        // USERS MANAGEMENT (admin only)
        // ========================================
        .route(
            "/api/admin/users",
            get(handlers::users::list)
                .layer(middleware::from_fn(auth::middleware::require_admin)),
        )
        .route(
            "/api/admin/users/:id",
            put(handlers::users::update)
                .delete(handlers::users::delete)
                .layer(middleware::from_fn(auth::middleware::require_admin)),
        )
}
