use axum::Json;
use contracts::catalog::{catalog, Taxonomy};

/// GET /api/catalog/taxonomy
pub async fn taxonomy() -> Json<&'static Taxonomy> {
    Json(catalog())
}
