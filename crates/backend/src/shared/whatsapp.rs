use contracts::domain::a002_publication::aggregate::PublicationType;

use crate::shared::config::StorefrontConfig;

/// Click-to-chat link with a prefilled message.
pub fn wa_link(number: &str, message: &str) -> String {
    format!(
        "https://wa.me/{}?text={}",
        number,
        urlencoding::encode(message)
    )
}

pub fn product_url(storefront: &StorefrontConfig, slug: &str) -> String {
    format!("{}/catalogo/{}", storefront.base_url.trim_end_matches('/'), slug)
}

pub fn publication_url(storefront: &StorefrontConfig, slug: &str) -> String {
    format!(
        "{}/publicaciones/{}",
        storefront.base_url.trim_end_matches('/'),
        slug
    )
}

/// Purchase request for one product. Color and handle lines are left out
/// when not chosen.
pub fn product_message(
    title: &str,
    color: Option<&str>,
    handle: Option<&str>,
    quantity: u32,
    link: &str,
) -> String {
    let mut message = format!("Hola, me interesa comprar este producto:\n\n*{}*\n", title);
    if let Some(color) = color.filter(|c| !c.trim().is_empty()) {
        message.push_str(&format!("Color: {}\n", color));
    }
    if let Some(handle) = handle.filter(|h| !h.trim().is_empty()) {
        message.push_str(&format!("Manivela: {}\n", handle));
    }
    message.push_str(&format!("Cantidad: {}\n\nLink: {}", quantity.max(1), link));
    message
}

pub fn publication_message(publication_type: PublicationType, link: &str) -> String {
    match publication_type {
        PublicationType::Sorteo => format!(
            "Hola, me interesa participar en este sorteo:\n\n{}\n\n¿Me das más información?",
            link
        ),
        PublicationType::Anuncio => {
            format!("Hola, vi esta publicación y tengo una duda:\n\n{}", link)
        }
    }
}
