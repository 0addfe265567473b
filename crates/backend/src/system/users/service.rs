use anyhow::Result;
use chrono::Utc;
use contracts::system::users::{UpdateUserDto, User, UserRole};

use super::repository;
use crate::shared::error::ServiceError;
use crate::system::auth::password;

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    };
    if !valid {
        return Err(ServiceError::Validation("Correo electrónico inválido".into()).into());
    }
    Ok(email)
}

/// Create a new account with the given role.
pub async fn create(
    email: &str,
    password_plain: &str,
    full_name: Option<String>,
    role: UserRole,
) -> Result<String> {
    let email = normalize_email(email)?;

    if repository::get_by_email(&email).await?.is_some() {
        return Err(ServiceError::Conflict("El correo ya está registrado".into()).into());
    }

    password::validate_password_strength(password_plain)?;
    let password_hash = password::hash_password(password_plain)?;

    let now = Utc::now().to_rfc3339();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        email,
        full_name: full_name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        role,
        is_active: true,
        created_at: now.clone(),
        updated_at: now,
        last_login_at: None,
    };

    repository::create_with_password(&user, &password_hash).await?;
    tracing::info!("User created: {} ({})", user.email, user.role.as_str());
    Ok(user.id)
}

/// Self-service sign up; always a client account.
pub async fn register(email: &str, password_plain: &str, full_name: Option<String>) -> Result<String> {
    create(email, password_plain, full_name, UserRole::Client).await
}

/// Admin edit. An admin cannot demote or deactivate their own account.
pub async fn update(id: &str, dto: UpdateUserDto, requester_id: &str) -> Result<()> {
    let mut user = repository::get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Usuario".into()))?;

    if id == requester_id && (dto.role != UserRole::Admin || !dto.is_active) {
        return Err(ServiceError::Validation(
            "No puedes quitarte el rol de administrador ni desactivar tu cuenta".into(),
        )
        .into());
    }

    user.full_name = dto
        .full_name
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    user.role = dto.role;
    user.is_active = dto.is_active;
    user.updated_at = Utc::now().to_rfc3339();

    repository::update(&user).await
}

pub async fn delete(id: &str, requester_id: &str) -> Result<()> {
    if id == requester_id {
        return Err(ServiceError::Validation("No puedes eliminar tu propia cuenta".into()).into());
    }
    if !repository::delete(id).await? {
        return Err(ServiceError::NotFound("Usuario".into()).into());
    }
    tracing::info!("User deleted: {}", id);
    Ok(())
}

pub async fn get_by_id(id: &str) -> Result<Option<User>> {
    repository::get_by_id(id).await
}

/// `role_param` of `todos` or anything unknown lists every role.
pub async fn list(search: Option<&str>, role_param: Option<&str>) -> Result<Vec<User>> {
    repository::list(search, role_param.and_then(UserRole::from_param)).await
}

/// Verify user credentials (for login). Inactive accounts never match.
pub async fn verify_credentials(email: &str, password_plain: &str) -> Result<Option<User>> {
    let email = email.trim().to_lowercase();
    let user = match repository::get_by_email(&email).await? {
        Some(u) => u,
        None => return Ok(None),
    };

    if !user.is_active {
        tracing::warn!("Login attempt on inactive account {}", user.email);
        return Ok(None);
    }

    let password_hash = repository::get_password_hash(&user.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Password hash not found"))?;

    if !password::verify_password(password_plain, &password_hash)? {
        return Ok(None);
    }

    if let Err(e) = repository::update_last_login(&user.id).await {
        tracing::warn!("Failed to record login for {}: {}", user.email, e);
    }

    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Ana@BassOrilla.com ").unwrap(), "ana@bassorilla.com");
        assert!(normalize_email("sin-arroba").is_err());
        assert!(normalize_email("@bassorilla.com").is_err());
        assert!(normalize_email("ana@localhost").is_err());
    }
}
