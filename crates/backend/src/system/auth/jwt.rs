use anyhow::{Context, Result};
use chrono::Utc;
use contracts::system::auth::TokenClaims;
use contracts::system::users::UserRole;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::OnceCell;
use rand::Rng;
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use sha2::{Digest, Sha256};

use crate::shared::config;
use crate::shared::data::db::get_connection;

const ACCESS_TOKEN_LIFETIME_HOURS: i64 = 24;
const REFRESH_TOKEN_LIFETIME_DAYS: i64 = 90;

static JWT_SECRET: OnceCell<String> = OnceCell::new();

fn build_claims(user_id: &str, email: &str, role: UserRole) -> TokenClaims {
    let now = Utc::now();
    TokenClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role,
        exp: (now + chrono::Duration::hours(ACCESS_TOKEN_LIFETIME_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    }
}

fn encode_claims(claims: &TokenClaims, secret: &str) -> Result<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("Failed to encode JWT token")
}

fn decode_claims(token: &str, secret: &str) -> Result<TokenClaims> {
    let data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .context("Failed to decode JWT token")?;
    Ok(data.claims)
}

/// Generate JWT access token with 24 hours lifetime
pub async fn generate_access_token(user_id: &str, email: &str, role: UserRole) -> Result<String> {
    let secret = get_jwt_secret().await?;
    encode_claims(&build_claims(user_id, email, role), &secret)
}

/// Validate JWT token and extract claims
pub async fn validate_token(token: &str) -> Result<TokenClaims> {
    let secret = get_jwt_secret().await?;
    decode_claims(token, &secret)
}

/// Opaque refresh token; only its hash is stored.
pub fn generate_refresh_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Secret from `[auth] jwt_secret`, else the one kept in `sys_settings`
/// (generated on first use).
pub async fn get_jwt_secret() -> Result<String> {
    if let Some(secret) = JWT_SECRET.get() {
        return Ok(secret.clone());
    }

    let configured = config::get()
        .auth
        .jwt_secret
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let secret = match configured {
        Some(secret) => secret,
        None => match get_jwt_secret_from_db().await? {
            Some(secret) => secret,
            None => {
                let secret = generate_jwt_secret();
                save_jwt_secret_to_db(&secret).await?;
                tracing::info!("Generated a new JWT secret");
                secret
            }
        },
    };

    Ok(JWT_SECRET.get_or_init(|| secret).clone())
}

/// 256 random bits, base64 encoded.
fn generate_jwt_secret() -> String {
    use base64::{engine::general_purpose, Engine as _};
    let mut rng = rand::thread_rng();
    let random_bytes: Vec<u8> = (0..32).map(|_| rng.gen::<u8>()).collect();
    general_purpose::STANDARD.encode(&random_bytes)
}

async fn get_jwt_secret_from_db() -> Result<Option<String>> {
    let result = get_connection()
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT value FROM sys_settings WHERE key = ?",
            ["jwt_secret".into()],
        ))
        .await?;

    match result {
        Some(row) => Ok(Some(row.try_get("", "value")?)),
        None => Ok(None),
    }
}

async fn save_jwt_secret_to_db(secret: &str) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    get_connection()
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "INSERT OR REPLACE INTO sys_settings (key, value, description, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            [
                "jwt_secret".into(),
                secret.to_string().into(),
                "Auto-generated JWT secret for authentication".into(),
                now.clone().into(),
                now.into(),
            ],
        ))
        .await?;
    Ok(())
}

pub fn calculate_refresh_token_expiration() -> String {
    let exp = Utc::now() + chrono::Duration::days(REFRESH_TOKEN_LIFETIME_DAYS);
    exp.to_rfc3339()
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub async fn store_refresh_token(user_id: &str, token: &str) -> Result<()> {
    get_connection()
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "INSERT INTO sys_refresh_tokens (id, user_id, token_hash, expires_at, created_at)
             VALUES (?, ?, ?, ?, ?)",
            [
                uuid::Uuid::new_v4().to_string().into(),
                user_id.to_string().into(),
                hash_token(token).into(),
                calculate_refresh_token_expiration().into(),
                Utc::now().to_rfc3339().into(),
            ],
        ))
        .await?;
    Ok(())
}

/// User id owning a live (unexpired, unrevoked) refresh token.
pub async fn validate_refresh_token(token: &str) -> Result<String> {
    let result = get_connection()
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT user_id FROM sys_refresh_tokens
             WHERE token_hash = ? AND expires_at > ? AND revoked_at IS NULL",
            [hash_token(token).into(), Utc::now().to_rfc3339().into()],
        ))
        .await?;

    match result {
        Some(row) => Ok(row.try_get("", "user_id")?),
        None => Err(anyhow::anyhow!("Invalid or expired refresh token")),
    }
}

pub async fn revoke_refresh_token(token: &str) -> Result<()> {
    get_connection()
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "UPDATE sys_refresh_tokens SET revoked_at = ? WHERE token_hash = ?",
            [Utc::now().to_rfc3339().into(), hash_token(token).into()],
        ))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_round_trip_with_role() {
        let claims = build_claims("u-1", "admin@bassorilla.com", UserRole::Admin);
        let token = encode_claims(&claims, "test-secret").unwrap();
        let decoded = decode_claims(&token, "test-secret").unwrap();
        assert_eq!(decoded.sub, "u-1");
        assert!(decoded.is_admin());
        assert!(decode_claims(&token, "other-secret").is_err());
    }

    #[test]
    fn refresh_tokens_are_hashed() {
        let token = generate_refresh_token();
        let hash = hash_token(&token);
        assert_eq!(hash.len(), 64);
        assert_ne!(hash, token);
        assert_eq!(hash, hash_token(&token));
    }

    #[test]
    fn generated_secrets_differ() {
        assert_ne!(generate_jwt_secret(), generate_jwt_secret());
    }
}
