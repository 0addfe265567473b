use axum::{
    extract::{Json, Path, Query},
    http::StatusCode,
};
use contracts::system::users::{UpdateUserDto, User};
use serde::Deserialize;

use crate::shared::error::status_for;
use crate::system::auth::extractor::CurrentUser;
use crate::system::users::service;

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub search: Option<String>,
    pub role: Option<String>,
}

/// List users, optionally filtered by name/email and role (admin only)
pub async fn list(Query(query): Query<UserListQuery>) -> Result<Json<Vec<User>>, StatusCode> {
    let users = service::list(query.search.as_deref(), query.role.as_deref())
        .await
        .map_err(|e| status_for("Failed to list users", &e))?;
    Ok(Json(users))
}

/// Update user (admin only)
pub async fn update(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
    Json(dto): Json<UpdateUserDto>,
) -> Result<StatusCode, StatusCode> {
    service::update(&id, dto, &claims.sub)
        .await
        .map_err(|e| status_for("Failed to update user", &e))?;
    Ok(StatusCode::OK)
}

/// Delete user (admin only)
pub async fn delete(
    CurrentUser(claims): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    service::delete(&id, &claims.sub)
        .await
        .map_err(|e| status_for("Failed to delete user", &e))?;
    Ok(StatusCode::OK)
}
