use anyhow::Result;
use contracts::dashboards::d100_admin_summary::AdminSummaryResponse;
use contracts::system::users::UserRole;

use crate::domain::{a001_product, a002_publication};
use crate::system::users::repository as users;

/// Counters shown on the admin landing page.
pub async fn get_summary() -> Result<AdminSummaryResponse> {
    let (products_total, products_active, products_on_offer) =
        a001_product::repository::counts().await?;
    let (publications_total, raffles_active) = a002_publication::repository::counts().await?;

    Ok(AdminSummaryResponse {
        users_total: users::count_users().await?,
        admins_total: users::count_by_role(UserRole::Admin).await?,
        products_total,
        products_active,
        products_on_offer,
        publications_total,
        raffles_active,
    })
}
