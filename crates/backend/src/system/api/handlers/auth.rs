use axum::{extract::Json, http::StatusCode};
use contracts::system::auth::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest, UserInfo,
};
use contracts::system::users::User;

use crate::shared::error::status_for;
use crate::system::auth::{extractor::CurrentUser, jwt};
use crate::system::users::service as user_service;

fn user_info(user: User) -> UserInfo {
    UserInfo {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
        role: user.role,
    }
}

async fn issue_tokens(user: User) -> anyhow::Result<LoginResponse> {
    let access_token = jwt::generate_access_token(&user.id, &user.email, user.role).await?;
    let refresh_token = jwt::generate_refresh_token();
    jwt::store_refresh_token(&user.id, &refresh_token).await?;

    Ok(LoginResponse {
        access_token,
        refresh_token,
        user: user_info(user),
    })
}

/// Sign up as a client and log in right away.
pub async fn register(
    Json(request): Json<RegisterRequest>,
) -> Result<Json<LoginResponse>, StatusCode> {
    let user_id = user_service::register(&request.email, &request.password, request.full_name)
        .await
        .map_err(|e| status_for("Registration failed", &e))?;

    let user = user_service::get_by_id(&user_id)
        .await
        .map_err(|e| status_for("Registration failed", &e))?
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    let response = issue_tokens(user)
        .await
        .map_err(|e| status_for("Registration failed", &e))?;
    Ok(Json(response))
}

pub async fn login(Json(request): Json<LoginRequest>) -> Result<Json<LoginResponse>, StatusCode> {
    let user = user_service::verify_credentials(&request.email, &request.password)
        .await
        .map_err(|e| status_for("Login failed", &e))?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let response = issue_tokens(user)
        .await
        .map_err(|e| status_for("Login failed", &e))?;
    tracing::info!("User logged in: {}", response.user.email);
    Ok(Json(response))
}

pub async fn refresh(
    Json(request): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, StatusCode> {
    let user_id = jwt::validate_refresh_token(&request.refresh_token)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let user = user_service::get_by_id(&user_id)
        .await
        .map_err(|e| status_for("Refresh failed", &e))?
        .filter(|u| u.is_active)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let access_token = jwt::generate_access_token(&user.id, &user.email, user.role)
        .await
        .map_err(|e| status_for("Refresh failed", &e))?;

    Ok(Json(RefreshResponse { access_token }))
}

pub async fn logout(Json(request): Json<RefreshRequest>) -> Result<StatusCode, StatusCode> {
    jwt::revoke_refresh_token(&request.refresh_token)
        .await
        .map_err(|e| status_for("Logout failed", &e))?;
    Ok(StatusCode::OK)
}

/// Get current user handler (protected by middleware)
pub async fn current_user(CurrentUser(claims): CurrentUser) -> Result<Json<UserInfo>, StatusCode> {
    let user = user_service::get_by_id(&claims.sub)
        .await
        .map_err(|e| status_for("Load current user", &e))?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(user_info(user)))
}
