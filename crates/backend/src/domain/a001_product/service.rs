use std::collections::HashMap;

use contracts::catalog::{CatalogQueryResolver, FilterState, FilterUpdates};
use contracts::domain::a001_product::aggregate::{
    Product, ProductDetailDto, ProductDto, ProductListItemDto, ProductPage, ProductVariant,
};
use contracts::domain::common::AggregateRoot;
use uuid::Uuid;

use super::repository;
use crate::shared::config;
use crate::shared::error::ServiceError;
use crate::shared::media;
use crate::shared::text::slugify;
use crate::shared::whatsapp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Audience {
    Storefront,
    Admin,
}

/// Public catalog page. Store failures are logged and shown as no results.
pub async fn list_catalog(params: &HashMap<String, String>) -> ProductPage {
    list_for(Audience::Storefront, params).await
}

/// Admin product table, inactive products included.
pub async fn list_admin(params: &HashMap<String, String>) -> ProductPage {
    list_for(Audience::Admin, params).await
}

async fn list_for(audience: Audience, params: &HashMap<String, String>) -> ProductPage {
    let resolver = CatalogQueryResolver::storefront();
    let (state, issues) = resolver.parse_with_issues(params);
    for issue in &issues {
        tracing::debug!("Catalog filter normalized: {}", issue);
    }

    let page_size = match audience {
        Audience::Storefront => config::get().catalog.public_page_size,
        Audience::Admin => config::get().catalog.admin_page_size,
    }
    .max(1);

    match load_page(resolver, audience, state.clone(), page_size).await {
        Ok(page) => page,
        Err(e) => {
            let err = ServiceError::DataStoreUnavailable(format!("{:#}", e));
            tracing::error!("Catalog listing failed: {}", err);
            empty_page(resolver, audience, state, page_size)
        }
    }
}

fn canonical_url(resolver: CatalogQueryResolver<'_>, audience: Audience, state: &FilterState) -> String {
    match audience {
        Audience::Storefront => resolver.build_url(state, &FilterUpdates::new()),
        Audience::Admin => resolver.build_admin_url(state, &FilterUpdates::new()),
    }
}

async fn query_page(
    resolver: CatalogQueryResolver<'_>,
    audience: Audience,
    state: &FilterState,
    page_size: u64,
) -> anyhow::Result<(Vec<Product>, u64)> {
    let descriptor = match audience {
        Audience::Storefront => resolver.to_query_descriptor(state, page_size),
        Audience::Admin => resolver.to_admin_query_descriptor(state, page_size),
    };
    tracing::debug!("Catalog query: {}", descriptor);
    repository::list_by_descriptor(&descriptor).await
}

async fn load_page(
    resolver: CatalogQueryResolver<'_>,
    audience: Audience,
    mut state: FilterState,
    page_size: u64,
) -> anyhow::Result<ProductPage> {
    let (mut items, mut total) = query_page(resolver, audience, &state, page_size).await?;
    let mut total_pages = total_pages(total, page_size);

    if let Some(last) = fallback_page(state.page(), !items.is_empty(), total_pages) {
        state = state.with_page(last);
        (items, total) = query_page(resolver, audience, &state, page_size).await?;
        total_pages = self::total_pages(total, page_size);
    }

    Ok(ProductPage {
        items: items.iter().map(ProductListItemDto::from).collect(),
        total,
        page: state.page(),
        page_size,
        total_pages,
        canonical_url: canonical_url(resolver, audience, &state),
        filters: state,
    })
}

fn empty_page(
    resolver: CatalogQueryResolver<'_>,
    audience: Audience,
    state: FilterState,
    page_size: u64,
) -> ProductPage {
    ProductPage {
        items: Vec::new(),
        total: 0,
        page: state.page(),
        page_size,
        total_pages: 0,
        canonical_url: canonical_url(resolver, audience, &state),
        filters: state,
    }
}

fn total_pages(total: u64, page_size: u64) -> u64 {
    (total + page_size - 1) / page_size
}

/// Past the last page: the last page to serve instead of an empty grid.
fn fallback_page(requested: u32, found_items: bool, total_pages: u64) -> Option<u32> {
    if found_items || total_pages == 0 || u64::from(requested) <= total_pages {
        return None;
    }
    Some(u32::try_from(total_pages).unwrap_or(u32::MAX))
}

/// Active product page data, `None` for unknown or hidden products.
pub async fn get_by_slug(slug: &str) -> anyhow::Result<Option<ProductDetailDto>> {
    let Some(product) = repository::get_by_slug(slug).await? else {
        return Ok(None);
    };
    if !product.is_active {
        return Ok(None);
    }
    Ok(Some(detail(product)))
}

fn detail(product: Product) -> ProductDetailDto {
    let storefront = &config::get().storefront;
    let share_url = whatsapp::product_url(storefront, &product.slug);
    let handle_options = product.handle_options();
    let message = whatsapp::product_message(
        &product.title,
        product.variants.first().map(|v| v.color_name.as_str()),
        handle_options.first().map(String::as_str),
        1,
        &share_url,
    );

    ProductDetailDto {
        breadcrumbs: product.breadcrumbs(),
        specs: product.spec_entries(),
        whatsapp_url: whatsapp::wa_link(&storefront.whatsapp_number, &message),
        handle_options,
        share_url,
        product,
    }
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<Product>> {
    repository::get_by_id(id).await
}

/// Slug from the title, suffixed `-2`, `-3`, ... while another product
/// holds it.
async fn unique_slug(title: &str, except: Option<Uuid>) -> anyhow::Result<String> {
    let base = match slugify(title) {
        s if s.is_empty() => "producto".to_string(),
        s => s,
    };
    let mut candidate = base.clone();
    let mut n = 2;
    while repository::slug_taken(&candidate, except).await? {
        candidate = format!("{}-{}", base, n);
        n += 1;
    }
    Ok(candidate)
}

pub async fn create(dto: ProductDto) -> anyhow::Result<Uuid> {
    let slug = unique_slug(&dto.title, None).await?;
    let mut aggregate = Product::new_for_insert(&dto, slug);

    aggregate
        .validate(CatalogQueryResolver::storefront().taxonomy())
        .map_err(ServiceError::Validation)?;
    aggregate.before_write();

    let id = repository::insert(&aggregate).await?;
    tracing::info!("Product created: {} ({})", aggregate.title, aggregate.slug);
    Ok(id)
}

pub async fn update(id: Uuid, dto: ProductDto) -> anyhow::Result<()> {
    let mut aggregate = repository::get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(Product::element_name().into()))?;

    let previous_variants = aggregate.variants.clone();
    let slug = unique_slug(&dto.title, Some(id)).await?;
    aggregate.update(&dto, slug);

    aggregate
        .validate(CatalogQueryResolver::storefront().taxonomy())
        .map_err(ServiceError::Validation)?;
    aggregate.before_write();

    repository::update(&aggregate).await?;

    let host = media::host();
    for url in dropped_images(&previous_variants, &aggregate.variants) {
        if let Err(e) = host.delete(&url).await {
            tracing::warn!("Could not delete replaced image {}: {}", url, e);
        }
    }
    Ok(())
}

/// Image URLs used by `before` that no variant in `after` still uses.
fn dropped_images(before: &[ProductVariant], after: &[ProductVariant]) -> Vec<String> {
    let mut dropped: Vec<String> = Vec::new();
    for url in before.iter().map(|v| v.image_url.trim()) {
        let kept = after.iter().any(|v| v.image_url.trim() == url);
        if !url.is_empty() && !kept && !dropped.iter().any(|d| d == url) {
            dropped.push(url.to_string());
        }
    }
    dropped
}

pub async fn set_active(id: Uuid, is_active: bool) -> anyhow::Result<()> {
    if !repository::set_active(id, is_active).await? {
        return Err(ServiceError::NotFound(Product::element_name().into()).into());
    }
    tracing::info!("Product {} is_active={}", id, is_active);
    Ok(())
}

/// Removes variant images from the media host, then the product itself.
pub async fn delete(id: Uuid) -> anyhow::Result<()> {
    let product = repository::get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(Product::element_name().into()))?;

    let host = media::host();
    for variant in &product.variants {
        if let Err(e) = host.delete(&variant.image_url).await {
            tracing::warn!("Could not delete image {}: {}", variant.image_url, e);
        }
    }

    repository::delete(id).await?;
    tracing::info!("Product deleted: {} ({})", product.title, id);
    Ok(())
}

/// Uploads a product photo into the folder of its department and category.
pub async fn upload_image(
    bytes: Vec<u8>,
    content_type: &str,
    department: &str,
    category: &str,
) -> anyhow::Result<String> {
    let taxonomy = CatalogQueryResolver::storefront().taxonomy();
    if !taxonomy.has_category(department, category) {
        return Err(ServiceError::Validation(format!(
            "Clasificación inválida: {} > {}",
            department, category
        ))
        .into());
    }
    let folder = media::product_folder(&config::get().media.root_folder, department, category);
    let url = media::host().upload(bytes, content_type, &folder).await?;
    Ok(url)
}
