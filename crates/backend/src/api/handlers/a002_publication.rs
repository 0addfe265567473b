use axum::{
    extract::{Multipart, Path, Query},
    http::StatusCode,
    Json,
};
use contracts::domain::a002_publication::aggregate::{
    Publication, PublicationDetailDto, PublicationDto,
};
use serde::Deserialize;
use uuid::Uuid;

use super::a001_product::{read_upload, CreatedResponse, UploadResponse};
use crate::domain::a002_publication;
use crate::shared::error::status_for;

#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub publication_type: Option<String>,
}

/// GET /api/publications
pub async fn list_active() -> Result<Json<Vec<Publication>>, StatusCode> {
    a002_publication::service::list_active()
        .await
        .map(Json)
        .map_err(|e| status_for("Failed to list publications", &e))
}

/// GET /api/publications/home
pub async fn home_feed() -> Result<Json<Vec<Publication>>, StatusCode> {
    a002_publication::service::home_feed()
        .await
        .map(Json)
        .map_err(|e| status_for("Failed to load home publications", &e))
}

/// GET /api/publications/:slug
pub async fn get_by_slug(
    Path(slug): Path<String>,
) -> Result<Json<PublicationDetailDto>, StatusCode> {
    match a002_publication::service::get_by_slug(&slug).await {
        Ok(Some(detail)) => Ok(Json(detail)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => Err(status_for(&format!("Failed to get publication {}", slug), &e)),
    }
}

/// GET /api/admin/publications?search&type
pub async fn list_admin(
    Query(query): Query<AdminListQuery>,
) -> Result<Json<Vec<Publication>>, StatusCode> {
    a002_publication::service::list_admin(
        query.search.as_deref(),
        query.publication_type.as_deref(),
    )
    .await
    .map(Json)
    .map_err(|e| status_for("Failed to list publications", &e))
}

/// POST /api/admin/publications
pub async fn create(Json(dto): Json<PublicationDto>) -> Result<Json<CreatedResponse>, StatusCode> {
    let id = a002_publication::service::create(dto)
        .await
        .map_err(|e| status_for("Failed to create publication", &e))?;
    Ok(Json(CreatedResponse { id: id.to_string() }))
}

/// PUT /api/admin/publications/:id
pub async fn update(
    Path(id): Path<String>,
    Json(dto): Json<PublicationDto>,
) -> Result<StatusCode, StatusCode> {
    let uuid = Uuid::parse_str(&id).map_err(|_| StatusCode::BAD_REQUEST)?;
    a002_publication::service::update(uuid, dto)
        .await
        .map_err(|e| status_for(&format!("Failed to update publication {}", id), &e))?;
    Ok(StatusCode::OK)
}

/// DELETE /api/admin/publications/:id
pub async fn delete(Path(id): Path<String>) -> Result<StatusCode, StatusCode> {
    let uuid = Uuid::parse_str(&id).map_err(|_| StatusCode::BAD_REQUEST)?;
    a002_publication::service::delete(uuid)
        .await
        .map_err(|e| status_for(&format!("Failed to delete publication {}", id), &e))?;
    Ok(StatusCode::OK)
}

/// POST /api/admin/publications/banner (multipart: image)
pub async fn upload_banner(multipart: Multipart) -> Result<Json<UploadResponse>, StatusCode> {
    let form = read_upload(multipart).await?;
    let url = a002_publication::service::upload_banner(form.bytes, &form.content_type)
        .await
        .map_err(|e| status_for("Failed to upload banner", &e))?;
    Ok(Json(UploadResponse { url }))
}
