use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, Query},
    http::StatusCode,
    Json,
};
use contracts::domain::a001_product::aggregate::{
    Product, ProductDetailDto, ProductDto, ProductPage, SetActiveRequest,
};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::a001_product;
use crate::shared::error::status_for;

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

fn parse_id(id: &str) -> Result<Uuid, StatusCode> {
    Uuid::parse_str(id).map_err(|_| StatusCode::BAD_REQUEST)
}

/// GET /api/catalog/products?dept&cat&subcat&q&sort&page
pub async fn list_catalog(Query(params): Query<HashMap<String, String>>) -> Json<ProductPage> {
    Json(a001_product::service::list_catalog(&params).await)
}

/// GET /api/catalog/products/:slug
pub async fn get_by_slug(Path(slug): Path<String>) -> Result<Json<ProductDetailDto>, StatusCode> {
    match a001_product::service::get_by_slug(&slug).await {
        Ok(Some(detail)) => Ok(Json(detail)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => Err(status_for(&format!("Failed to get product {}", slug), &e)),
    }
}

/// GET /api/admin/products
pub async fn list_admin(Query(params): Query<HashMap<String, String>>) -> Json<ProductPage> {
    Json(a001_product::service::list_admin(&params).await)
}

/// GET /api/admin/products/:id
pub async fn get_by_id(Path(id): Path<String>) -> Result<Json<Product>, StatusCode> {
    let uuid = parse_id(&id)?;
    match a001_product::service::get_by_id(uuid).await {
        Ok(Some(product)) => Ok(Json(product)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => Err(status_for(&format!("Failed to get product {}", id), &e)),
    }
}

/// POST /api/admin/products
pub async fn create(Json(dto): Json<ProductDto>) -> Result<Json<CreatedResponse>, StatusCode> {
    let id = a001_product::service::create(dto)
        .await
        .map_err(|e| status_for("Failed to create product", &e))?;
    Ok(Json(CreatedResponse { id: id.to_string() }))
}

/// PUT /api/admin/products/:id
pub async fn update(
    Path(id): Path<String>,
    Json(dto): Json<ProductDto>,
) -> Result<StatusCode, StatusCode> {
    let uuid = parse_id(&id)?;
    a001_product::service::update(uuid, dto)
        .await
        .map_err(|e| status_for(&format!("Failed to update product {}", id), &e))?;
    Ok(StatusCode::OK)
}

/// POST /api/admin/products/:id/active
pub async fn set_active(
    Path(id): Path<String>,
    Json(request): Json<SetActiveRequest>,
) -> Result<StatusCode, StatusCode> {
    let uuid = parse_id(&id)?;
    a001_product::service::set_active(uuid, request.is_active)
        .await
        .map_err(|e| status_for(&format!("Failed to toggle product {}", id), &e))?;
    Ok(StatusCode::OK)
}

/// DELETE /api/admin/products/:id
pub async fn delete(Path(id): Path<String>) -> Result<StatusCode, StatusCode> {
    let uuid = parse_id(&id)?;
    a001_product::service::delete(uuid)
        .await
        .map_err(|e| status_for(&format!("Failed to delete product {}", id), &e))?;
    Ok(StatusCode::OK)
}

/// Image bytes, content type and the text fields sent alongside them.
pub(crate) struct UploadForm {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub fields: HashMap<String, String>,
}

/// Reads a multipart form whose file part is named `image` or `file`.
pub(crate) async fn read_upload(mut multipart: Multipart) -> Result<UploadForm, StatusCode> {
    let mut file: Option<(Vec<u8>, String)> = None;
    let mut fields = HashMap::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Malformed multipart upload: {}", e);
        StatusCode::BAD_REQUEST
    })? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" || name == "file" {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
            file = Some((bytes.to_vec(), content_type));
        } else {
            let value = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
            fields.insert(name, value);
        }
    }

    let (bytes, content_type) = file.ok_or(StatusCode::BAD_REQUEST)?;
    Ok(UploadForm {
        bytes,
        content_type,
        fields,
    })
}

/// POST /api/admin/products/images (multipart: image, department, category)
pub async fn upload_image(multipart: Multipart) -> Result<Json<UploadResponse>, StatusCode> {
    let form = read_upload(multipart).await?;
    let department = form.fields.get("department").map(String::as_str).unwrap_or_default();
    let category = form.fields.get("category").map(String::as_str).unwrap_or_default();

    let url = a001_product::service::upload_image(form.bytes, &form.content_type, department, category)
        .await
        .map_err(|e| status_for("Failed to upload product image", &e))?;
    Ok(Json(UploadResponse { url }))
}
