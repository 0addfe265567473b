use serde::{Deserialize, Serialize};

/// Counters for the admin dashboard landing page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSummaryResponse {
    pub users_total: u64,
    pub admins_total: u64,
    pub products_total: u64,
    pub products_active: u64,
    /// Active products with a discount price
    pub products_on_offer: u64,
    pub publications_total: u64,
    /// Active publications of type "sorteo"
    pub raffles_active: u64,
}
