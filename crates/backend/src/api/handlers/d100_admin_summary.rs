use axum::{http::StatusCode, Json};
use contracts::dashboards::d100_admin_summary::AdminSummaryResponse;

use crate::dashboards::d100_admin_summary::service;
use crate::shared::error::status_for;

/// GET /api/admin/summary
pub async fn get_summary() -> Result<Json<AdminSummaryResponse>, StatusCode> {
    let summary = service::get_summary()
        .await
        .map_err(|e| status_for("D100 Dashboard: failed to build summary", &e))?;
    tracing::debug!(
        "D100 Dashboard: {} products, {} publications, {} users",
        summary.products_total,
        summary.publications_total,
        summary.users_total
    );
    Ok(Json(summary))
}
