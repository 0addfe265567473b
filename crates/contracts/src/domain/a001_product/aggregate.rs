use crate::catalog::query_descriptor::{CatalogRow, FieldValue, ProductField};
use crate::catalog::{build_url, FilterState, FilterUpdates, Taxonomy, CATALOG_PATH};
use crate::domain::common::{AggregateId, AggregateRoot, EntityMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub Uuid);

impl ProductId {
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

impl AggregateId for ProductId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(ProductId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Color variant with its own photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub color_name: String,
    pub image_url: String,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

fn default_in_stock() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    pub brand: String,
    pub description: String,
    pub department: String,
    pub category: String,
    pub subcategory: String,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub variants: Vec<ProductVariant>,
    /// Free text, one `Name: Value` per line.
    pub specs: Option<String>,
    pub is_active: bool,
    #[serde(flatten)]
    pub metadata: EntityMetadata,
}

impl Product {
    /// New products start visible.
    pub fn new_for_insert(dto: &ProductDto, slug: String) -> Self {
        let mut product = Self {
            id: ProductId::new_v4(),
            title: String::new(),
            slug: String::new(),
            brand: String::new(),
            description: String::new(),
            department: String::new(),
            category: String::new(),
            subcategory: String::new(),
            price: 0.0,
            discount_price: None,
            variants: Vec::new(),
            specs: None,
            is_active: true,
            metadata: EntityMetadata::new(),
        };
        product.update(dto, slug);
        product
    }

    pub fn to_string_id(&self) -> String {
        self.id.as_string()
    }

    pub fn update(&mut self, dto: &ProductDto, slug: String) {
        self.title = dto.title.trim().to_string();
        self.slug = slug;
        self.brand = dto.brand.trim().to_string();
        self.description = dto.description.trim().to_string();
        self.department = dto.department.clone();
        self.category = dto.category.clone();
        self.subcategory = dto.subcategory.clone();
        self.price = dto.price;
        self.discount_price = dto.discount_price;
        self.variants = dto.variants.clone();
        self.specs = dto
            .specs
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
    }

    pub fn validate(&self, taxonomy: &Taxonomy) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("El título es obligatorio".into());
        }
        if self.brand.trim().is_empty() {
            return Err("La marca es obligatoria".into());
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err("El precio debe ser un número mayor o igual a 0".into());
        }
        if let Some(discount) = self.discount_price {
            if !discount.is_finite() || discount < 0.0 {
                return Err("El precio de oferta debe ser mayor o igual a 0".into());
            }
        }
        if !taxonomy.contains_path(
            &self.department,
            Some(&self.category),
            Some(&self.subcategory),
        ) {
            return Err(format!(
                "Clasificación inválida: {} > {} > {}",
                self.department, self.category, self.subcategory
            ));
        }
        if self.variants.is_empty() {
            return Err("Agrega al menos una variante con imagen".into());
        }
        for (i, variant) in self.variants.iter().enumerate() {
            if variant.color_name.trim().is_empty() {
                return Err(format!("La variante {} no tiene color", i + 1));
            }
            if variant.image_url.trim().is_empty() {
                return Err(format!("La variante {} no tiene imagen", i + 1));
            }
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.metadata.touch();
    }

    pub fn has_discount(&self) -> bool {
        self.discount_price.is_some()
    }

    /// Price the customer pays.
    pub fn effective_price(&self) -> f64 {
        self.discount_price.unwrap_or(self.price)
    }

    pub fn cover_image(&self) -> Option<&str> {
        self.variants.first().map(|v| v.image_url.as_str())
    }

    pub fn in_stock(&self) -> bool {
        self.variants.iter().any(|v| v.in_stock)
    }

    /// `Name: Value` lines of `specs`. Lines without a colon become a name
    /// with an empty value.
    pub fn spec_entries(&self) -> Vec<SpecEntry> {
        let Some(specs) = &self.specs else {
            return Vec::new();
        };
        specs
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| match line.split_once(':') {
                Some((name, value)) => SpecEntry {
                    name: name.trim().to_string(),
                    value: value.trim().to_string(),
                },
                None => SpecEntry {
                    name: line.to_string(),
                    value: String::new(),
                },
            })
            .collect()
    }

    /// Handle side choices for reels, read from a `Manivela: ...` spec line.
    pub fn handle_options(&self) -> Vec<String> {
        self.spec_entries()
            .into_iter()
            .find(|entry| entry.name.to_lowercase().contains("manivela"))
            .map(|entry| {
                entry
                    .value
                    .split([',', '/'])
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Catalog, department and category links leading to this product.
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        let department = FilterState::new().with_department(self.department.clone());
        let category = department.clone().with_category(self.category.clone());
        vec![
            Breadcrumb {
                label: "Catálogo".into(),
                url: CATALOG_PATH.into(),
            },
            Breadcrumb {
                label: self.department.clone(),
                url: build_url(&department, &FilterUpdates::new()),
            },
            Breadcrumb {
                label: self.category.clone(),
                url: build_url(&category, &FilterUpdates::new()),
            },
        ]
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

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
        "a001"
    }

    fn collection_name() -> &'static str {
        "product"
    }

    fn element_name() -> &'static str {
        "Producto"
    }
}

impl CatalogRow for Product {
    fn value(&self, field: ProductField) -> Option<FieldValue> {
        let text = |s: &str| Some(FieldValue::Text(s.to_string()));
        match field {
            ProductField::Department => text(&self.department),
            ProductField::Category => text(&self.category),
            ProductField::Subcategory => text(&self.subcategory),
            ProductField::Title => text(&self.title),
            ProductField::Brand => text(&self.brand),
            ProductField::Price => Some(FieldValue::Number(self.price)),
            ProductField::DiscountPrice => self.discount_price.map(FieldValue::Number),
            ProductField::IsActive => Some(FieldValue::Bool(self.is_active)),
            ProductField::CreatedAt => Some(FieldValue::Timestamp(self.metadata.created_at)),
        }
    }
}

// ============================================================================
// DTO
// ============================================================================

/// Admin create/update payload.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProductDto {
    pub title: String,
    pub brand: String,
    #[serde(default)]
    pub description: String,
    pub department: String,
    pub category: String,
    pub subcategory: String,
    pub price: f64,
    pub discount_price: Option<f64>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    pub specs: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// Catalog grid card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListItemDto {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub brand: String,
    pub department: String,
    pub category: String,
    pub subcategory: String,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub image_url: Option<String>,
    pub in_stock: bool,
    pub is_active: bool,
    pub created_at: String,
}

impl From<&Product> for ProductListItemDto {
    fn from(p: &Product) -> Self {
        Self {
            id: p.to_string_id(),
            title: p.title.clone(),
            slug: p.slug.clone(),
            brand: p.brand.clone(),
            department: p.department.clone(),
            category: p.category.clone(),
            subcategory: p.subcategory.clone(),
            price: p.price,
            discount_price: p.discount_price,
            image_url: p.cover_image().map(str::to_string),
            in_stock: p.in_stock(),
            is_active: p.is_active,
            created_at: p.metadata.created_at.to_rfc3339(),
        }
    }
}

/// One catalog page plus the normalized filters and the canonical link.
#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub items: Vec<ProductListItemDto>,
    pub total: u64,
    pub page: u32,
    pub page_size: u64,
    pub total_pages: u64,
    pub filters: FilterState,
    pub canonical_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecEntry {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductDetailDto {
    pub product: Product,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub specs: Vec<SpecEntry>,
    pub handle_options: Vec<String>,
    pub share_url: String,
    pub whatsapp_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::catalog;

    fn dto() -> ProductDto {
        ProductDto {
            title: "  Carrete Shimano Sedona 2500 ".into(),
            brand: "Shimano".into(),
            description: "Carrete ligero".into(),
            department: "Agua Dulce".into(),
            category: "Carretes".into(),
            subcategory: "Spinning".into(),
            price: 1899.0,
            discount_price: None,
            variants: vec![ProductVariant {
                color_name: "Negro".into(),
                image_url: "https://res.cloudinary.com/demo/image/upload/v1/a.jpg".into(),
                in_stock: true,
            }],
            specs: Some("Rodamientos: 3+1\nManivela: Derecha, Izquierda\nPeso: 255 g\n\n".into()),
        }
    }

    #[test]
    fn new_product_is_active_and_trimmed() {
        let product = Product::new_for_insert(&dto(), "carrete-shimano-sedona-2500".into());
        assert!(product.is_active);
        assert_eq!(product.title, "Carrete Shimano Sedona 2500");
        assert!(product.validate(catalog()).is_ok());
    }

    fn rejection(mutate: impl Fn(&mut ProductDto)) -> String {
        let mut input = dto();
        mutate(&mut input);
        Product::new_for_insert(&input, "x".into())
            .validate(catalog())
            .unwrap_err()
    }

    #[test]
    fn validation_rejects_bad_input() {
        assert!(rejection(|d| d.title = " ".into()).contains("título"));
        assert!(rejection(|d| d.brand.clear()).contains("marca"));
        assert!(rejection(|d| d.price = -1.0).contains("precio"));
        assert!(rejection(|d| d.discount_price = Some(-5.0)).contains("oferta"));
        assert!(rejection(|d| d.subcategory = "Spinning y Casting".into()).contains("Clasificación"));
        assert!(rejection(|d| d.variants.clear()).contains("variante"));
        assert!(rejection(|d| d.variants[0].image_url.clear()).contains("imagen"));
    }

    #[test]
    fn specs_split_into_entries_and_handle_options() {
        let product = Product::new_for_insert(&dto(), "x".into());
        let specs = product.spec_entries();
        assert_eq!(specs.len(), 3);
        assert_eq!(
            specs[0],
            SpecEntry {
                name: "Rodamientos".into(),
                value: "3+1".into()
            }
        );
        assert_eq!(product.handle_options(), vec!["Derecha", "Izquierda"]);
    }

    #[test]
    fn breadcrumbs_link_department_and_category() {
        let product = Product::new_for_insert(&dto(), "x".into());
        let urls: Vec<String> = product.breadcrumbs().into_iter().map(|b| b.url).collect();
        assert_eq!(
            urls,
            vec![
                "/catalogo",
                "/catalogo?dept=Agua+Dulce",
                "/catalogo?dept=Agua+Dulce&cat=Carretes",
            ]
        );
    }

    #[test]
    fn effective_price_prefers_discount() {
        let mut input = dto();
        input.discount_price = Some(1599.0);
        let product = Product::new_for_insert(&input, "x".into());
        assert!(product.has_discount());
        assert_eq!(product.effective_price(), 1599.0);
        let card = ProductListItemDto::from(&product);
        assert_eq!(card.image_url.as_deref(), product.cover_image());
        assert!(card.in_stock);
    }
}
