use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use contracts::system::auth::TokenClaims;
use contracts::system::users::{User, UserRole};

use crate::system::users::repository as users;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

async fn claims_of(token: Option<String>) -> Result<TokenClaims, StatusCode> {
    let token = token.ok_or(StatusCode::UNAUTHORIZED)?;
    super::jwt::validate_token(&token).await.map_err(|e| {
        tracing::debug!("Rejected bearer token: {:#}", e);
        StatusCode::UNAUTHORIZED
    })
}

/// The stored account, not the token, decides admin access: demoted,
/// deactivated or deleted accounts lose it at once.
fn admin_access(claims: &TokenClaims, account: Option<&User>) -> Result<(), StatusCode> {
    match account {
        None => Err(StatusCode::UNAUTHORIZED),
        Some(user) if !user.is_active => Err(StatusCode::UNAUTHORIZED),
        Some(user) if claims.is_admin() && user.role == UserRole::Admin => Ok(()),
        Some(_) => Err(StatusCode::FORBIDDEN),
    }
}

/// Middleware that requires valid JWT authentication
pub async fn require_auth(mut req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let token = bearer_token(req.headers()).map(str::to_owned);
    let claims = claims_of(token).await?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Middleware that requires an active admin account
pub async fn require_admin(mut req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let token = bearer_token(req.headers()).map(str::to_owned);
    let claims = claims_of(token).await?;

    let account = users::get_by_id(&claims.sub).await.map_err(|e| {
        tracing::error!("Failed to load account {}: {}", claims.sub, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    if let Err(status) = admin_access(&claims, account.as_ref()) {
        tracing::warn!("Admin access denied to {} for {}", claims.email, req.uri().path());
        return Err(status);
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
