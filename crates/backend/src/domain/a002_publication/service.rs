use contracts::domain::a002_publication::aggregate::{
    Publication, PublicationDetailDto, PublicationDto, PublicationType,
};
use contracts::domain::common::AggregateRoot;
use uuid::Uuid;

use super::repository;
use crate::shared::config;
use crate::shared::error::ServiceError;
use crate::shared::media;
use crate::shared::text::slugify;
use crate::shared::whatsapp;

const HOME_FEED_SIZE: u64 = 6;

/// Path segments under `/api/publications` that a slug must not shadow.
const RESERVED_SLUGS: &[&str] = &["home"];

fn is_reserved(slug: &str) -> bool {
    RESERVED_SLUGS.contains(&slug)
}

pub async fn list_active() -> anyhow::Result<Vec<Publication>> {
    repository::list_active().await
}

pub async fn home_feed() -> anyhow::Result<Vec<Publication>> {
    repository::home_feed(HOME_FEED_SIZE).await
}

pub async fn get_by_slug(slug: &str) -> anyhow::Result<Option<PublicationDetailDto>> {
    let publication = repository::get_by_slug(slug)
        .await?
        .filter(|p| p.is_active);
    Ok(publication.map(detail))
}

fn detail(publication: Publication) -> PublicationDetailDto {
    let storefront = &config::get().storefront;
    let share_url = whatsapp::publication_url(storefront, &publication.slug);
    let message = whatsapp::publication_message(publication.publication_type, &share_url);
    PublicationDetailDto {
        whatsapp_url: whatsapp::wa_link(&storefront.whatsapp_number, &message),
        share_url,
        publication,
    }
}

/// Admin board. `type_param` of `todos` or anything unknown lists every type.
pub async fn list_admin(
    search: Option<&str>,
    type_param: Option<&str>,
) -> anyhow::Result<Vec<Publication>> {
    let publication_type = type_param.and_then(PublicationType::from_param);
    repository::list_admin(search, publication_type).await
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<Publication>> {
    repository::get_by_id(id).await
}

async fn unique_slug(title: &str, except: Option<Uuid>) -> anyhow::Result<String> {
    let base = match slugify(title) {
        s if s.is_empty() => "publicacion".to_string(),
        s => s,
    };
    let mut candidate = base.clone();
    let mut n = 2;
    while is_reserved(&candidate) || repository::slug_taken(&candidate, except).await? {
        candidate = format!("{}-{}", base, n);
        n += 1;
    }
    Ok(candidate)
}

pub async fn create(dto: PublicationDto) -> anyhow::Result<Uuid> {
    let slug = unique_slug(&dto.title, None).await?;
    let mut aggregate = Publication::new_for_insert(&dto, slug);

    aggregate.validate().map_err(ServiceError::Validation)?;
    aggregate.before_write();

    let id = repository::insert(&aggregate).await?;
    tracing::info!(
        "Publication created: {} ({})",
        aggregate.title,
        aggregate.publication_type.as_str()
    );
    Ok(id)
}

pub async fn update(id: Uuid, dto: PublicationDto) -> anyhow::Result<()> {
    let mut aggregate = repository::get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(Publication::element_name().into()))?;

    let previous_image = aggregate.image_url.clone();
    let slug = unique_slug(&dto.title, Some(id)).await?;
    aggregate.update(&dto, slug);

    aggregate.validate().map_err(ServiceError::Validation)?;
    aggregate.before_write();
    repository::update(&aggregate).await?;

    if previous_image != aggregate.image_url {
        if let Err(e) = media::host().delete(&previous_image).await {
            tracing::warn!("Could not delete replaced banner {}: {}", previous_image, e);
        }
    }
    Ok(())
}

pub async fn delete(id: Uuid) -> anyhow::Result<()> {
    let publication = repository::get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(Publication::element_name().into()))?;

    if let Err(e) = media::host().delete(&publication.image_url).await {
        tracing::warn!("Could not delete banner {}: {}", publication.image_url, e);
    }
    repository::delete(id).await?;
    tracing::info!("Publication deleted: {} ({})", publication.title, id);
    Ok(())
}

pub async fn upload_banner(bytes: Vec<u8>, content_type: &str) -> anyhow::Result<String> {
    let folder = media::banner_folder(&config::get().media.root_folder);
    let url = media::host().upload(bytes, content_type, &folder).await?;
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_names_are_reserved() {
        assert!(is_reserved(&slugify("Home")));
        assert!(!is_reserved("home-2"));
        assert!(!is_reserved(&slugify("Gran Sorteo!")));
    }

    #[test]
    fn raffle_detail_invites_to_participate() {
        let dto = PublicationDto {
            title: "Gran Sorteo!".into(),
            description: "Gana un carrete".into(),
            publication_type: PublicationType::Sorteo,
            image_url: "https://res.cloudinary.com/demo/image/upload/b.jpg".into(),
            is_active: None,
        };
        let publication = Publication::new_for_insert(&dto, slugify(&dto.title));
        let detail = detail(publication);
        assert_eq!(detail.share_url, "https://bassorilla.com/publicaciones/gran-sorteo");
        assert!(detail.whatsapp_url.contains("participar%20en%20este%20sorteo"));
    }
}
