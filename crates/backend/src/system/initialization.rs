use anyhow::Result;
use contracts::system::users::UserRole;

use crate::shared::config;
use crate::system::users::{repository, service};

/// Creates the default admin from `[auth]` when the users table is empty.
pub async fn ensure_admin_user_exists() -> Result<()> {
    let count = repository::count_users().await?;
    if count > 0 {
        return Ok(());
    }

    tracing::info!("No users found. Creating default admin user...");
    let auth = &config::get().auth;
    let admin_id = service::create(
        &auth.default_admin_email,
        &auth.default_admin_password,
        Some("Administrador".to_string()),
        UserRole::Admin,
    )
    .await?;

    tracing::warn!("═══════════════════════════════════════════════");
    tracing::warn!("  Default admin user created!");
    tracing::warn!("  Email: {}", auth.default_admin_email);
    tracing::warn!("  User ID: {}", admin_id);
    tracing::warn!("  ⚠️  PLEASE CHANGE THE PASSWORD IMMEDIATELY!");
    tracing::warn!("═══════════════════════════════════════════════");
    Ok(())
}
