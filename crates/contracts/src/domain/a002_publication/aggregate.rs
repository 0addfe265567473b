use crate::domain::common::{AggregateId, AggregateRoot, EntityMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicationId(pub Uuid);

impl PublicationId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for PublicationId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(PublicationId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationType {
    Anuncio,
    Sorteo,
}

impl PublicationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationType::Anuncio => "anuncio",
            PublicationType::Sorteo => "sorteo",
        }
    }

    /// `None` for anything else, including the admin "todos" tab.
    pub fn from_param(raw: &str) -> Option<Self> {
        match raw.trim() {
            "anuncio" => Some(PublicationType::Anuncio),
            "sorteo" => Some(PublicationType::Sorteo),
            _ => None,
        }
    }
}

/// Banner shown on the home page and the publications board: either an
/// announcement or a raffle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub id: PublicationId,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub image_url: String,
    #[serde(rename = "type")]
    pub publication_type: PublicationType,
    pub is_active: bool,
    #[serde(flatten)]
    pub metadata: EntityMetadata,
}

impl Publication {
    pub fn new_for_insert(dto: &PublicationDto, slug: String) -> Self {
        let mut publication = Self {
            id: PublicationId::new_v4(),
            title: String::new(),
            slug: String::new(),
            description: String::new(),
            image_url: String::new(),
            publication_type: dto.publication_type,
            is_active: true,
            metadata: EntityMetadata::new(),
        };
        publication.update(dto, slug);
        publication
    }

    pub fn to_string_id(&self) -> String {
        self.id.as_string()
    }

    pub fn update(&mut self, dto: &PublicationDto, slug: String) {
        self.title = dto.title.trim().to_string();
        self.slug = slug;
        self.description = dto.description.trim().to_string();
        self.image_url = dto.image_url.trim().to_string();
        self.publication_type = dto.publication_type;
        if let Some(is_active) = dto.is_active {
            self.is_active = is_active;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title.is_empty() {
            return Err("El título es obligatorio".into());
        }
        if self.description.is_empty() {
            return Err("La descripción es obligatoria".into());
        }
        if self.image_url.is_empty() {
            return Err("Sube una imagen para la publicación".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.metadata.touch();
    }
}

impl AggregateRoot for Publication {
    type Id = PublicationId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.metadata
    }

    fn aggregate_index() -> &'static str {
        "a002"
    }

    fn collection_name() -> &'static str {
        "publication"
    }

    fn element_name() -> &'static str {
        "Publicación"
    }
}

// ============================================================================
// DTO
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationDto {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub publication_type: PublicationType,
    pub image_url: String,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicationDetailDto {
    pub publication: Publication,
    pub share_url: String,
    pub whatsapp_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto() -> PublicationDto {
        PublicationDto {
            title: " Gran Sorteo ".into(),
            description: "Participa por un combo".into(),
            publication_type: PublicationType::Sorteo,
            image_url: "https://res.cloudinary.com/demo/image/upload/v1/banner.jpg".into(),
            is_active: None,
        }
    }

    #[test]
    fn new_publication_defaults_to_active() {
        let publication = Publication::new_for_insert(&dto(), "gran-sorteo".into());
        assert!(publication.is_active);
        assert_eq!(publication.title, "Gran Sorteo");
        assert!(publication.validate().is_ok());
    }

    #[test]
    fn update_keeps_visibility_unless_given() {
        let mut publication = Publication::new_for_insert(&dto(), "gran-sorteo".into());
        let mut hidden = dto();
        hidden.is_active = Some(false);
        publication.update(&hidden, "gran-sorteo".into());
        assert!(!publication.is_active);
        publication.update(&dto(), "gran-sorteo".into());
        assert!(!publication.is_active);
    }

    #[test]
    fn image_is_required() {
        let mut input = dto();
        input.image_url = "  ".into();
        let publication = Publication::new_for_insert(&input, "x".into());
        assert!(publication.validate().unwrap_err().contains("imagen"));
    }

    #[test]
    fn type_uses_lowercase_wire_names() {
        let json = serde_json::to_value(Publication::new_for_insert(&dto(), "x".into())).unwrap();
        assert_eq!(json["type"], "sorteo");
        assert_eq!(PublicationType::from_param("todos"), None);
        assert_eq!(PublicationType::from_param("anuncio"), Some(PublicationType::Anuncio));
    }

    #[test]
    fn id_exposes_its_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(PublicationId::new(id).value(), id);
        assert_eq!(PublicationId::from_string(&id.to_string()).unwrap().value(), id);
    }
}
