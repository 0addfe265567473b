use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::api::handlers;
use crate::system::{self, auth};

/// Largest accepted image upload.
const UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// All application routes
pub fn configure_routes() -> Router {
    Router::new()
        .merge(system::api::routes::configure_system_routes())
        .merge(public_routes())
        .merge(admin_routes().route_layer(middleware::from_fn(auth::middleware::require_admin)))
}

fn public_routes() -> Router {
    Router::new()
        // ========================================
        // CATALOG (PUBLIC)
        // ========================================
        .route("/api/catalog/taxonomy", get(handlers::catalog::taxonomy))
        .route(
            "/api/catalog/products",
            get(handlers::a001_product::list_catalog),
        )
        .route(
            "/api/catalog/products/:slug",
            get(handlers::a001_product::get_by_slug),
        )
        // ========================================
        // PUBLICATIONS (PUBLIC)
        // ========================================
        .route(
            "/api/publications",
            get(handlers::a002_publication::list_active),
        )
        .route(
            "/api/publications/home",
            get(handlers::a002_publication::home_feed),
        )
        .route(
            "/api/publications/:slug",
            get(handlers::a002_publication::get_by_slug),
        )
}

fn admin_routes() -> Router {
    Router::new()
        // D100 Admin summary
        .route(
            "/api/admin/summary",
            get(handlers::d100_admin_summary::get_summary),
        )
        // A001 Products
        .route(
            "/api/admin/products",
            get(handlers::a001_product::list_admin).post(handlers::a001_product::create),
        )
        .route(
            "/api/admin/products/images",
            post(handlers::a001_product::upload_image)
                .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route(
            "/api/admin/products/:id",
            get(handlers::a001_product::get_by_id)
                .put(handlers::a001_product::update)
                .delete(handlers::a001_product::delete),
        )
        .route(
            "/api/admin/products/:id/active",
            post(handlers::a001_product::set_active),
        )
        // A002 Publications
        .route(
            "/api/admin/publications",
            get(handlers::a002_publication::list_admin).post(handlers::a002_publication::create),
        )
        .route(
            "/api/admin/publications/banner",
            post(handlers::a002_publication::upload_banner)
                .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        )
        .route(
            "/api/admin/publications/:id",
            put(handlers::a002_publication::update).delete(handlers::a002_publication::delete),
        )
}
