use chrono::Utc;
use contracts::catalog::{FieldValue, Predicate, ProductField, QueryDescriptor, SortDirection};
use contracts::domain::a001_product::aggregate::{Product, ProductId, ProductVariant};
use contracts::domain::common::EntityMetadata;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};

use crate::shared::data::db::get_connection;
use crate::shared::data::search::{contains_pattern, search_key};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a001_product")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub slug: String,
    pub brand: String,
    pub title_search: String,
    pub brand_search: String,
    pub description: String,
    pub department: String,
    pub category: String,
    pub subcategory: String,
    pub price: f64,
    pub discount_price: Option<f64>,
    /// JSON array of variants.
    #[sea_orm(column_type = "Text")]
    pub variants: String,
    pub specs: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Product {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let uuid = Uuid::parse_str(&m.id)
            .map_err(|e| anyhow::anyhow!("Product row has invalid id {:?}: {}", m.id, e))?;
        let variants: Vec<ProductVariant> = serde_json::from_str(&m.variants).unwrap_or_else(|e| {
            tracing::warn!("Product {} has unreadable variants: {}", m.id, e);
            Vec::new()
        });

        Ok(Product {
            id: ProductId(uuid),
            title: m.title,
            slug: m.slug,
            brand: m.brand,
            description: m.description,
            department: m.department,
            category: m.category,
            subcategory: m.subcategory,
            price: m.price,
            discount_price: m.discount_price,
            variants,
            specs: m.specs,
            is_active: m.is_active,
            metadata: EntityMetadata::with_timestamps(m.created_at, m.updated_at),
        })
    }
}

fn products(models: Vec<Model>) -> anyhow::Result<Vec<Product>> {
    models.into_iter().map(Product::try_from).collect()
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

fn column(field: ProductField) -> Column {
    match field {
        ProductField::Department => Column::Department,
        ProductField::Category => Column::Category,
        ProductField::Subcategory => Column::Subcategory,
        ProductField::Title => Column::Title,
        ProductField::Brand => Column::Brand,
        ProductField::Price => Column::Price,
        ProductField::DiscountPrice => Column::DiscountPrice,
        ProductField::IsActive => Column::IsActive,
        ProductField::CreatedAt => Column::CreatedAt,
    }
}

fn bind(value: &FieldValue) -> sea_orm::Value {
    match value {
        FieldValue::Text(s) => s.clone().into(),
        FieldValue::Bool(b) => (*b).into(),
        FieldValue::Number(n) => (*n).into(),
        FieldValue::Timestamp(t) => (*t).into(),
    }
}

/// Text search runs over the lowercased copies of title and brand.
fn search_column(field: ProductField) -> Column {
    match field {
        ProductField::Title => Column::TitleSearch,
        ProductField::Brand => Column::BrandSearch,
        other => column(other),
    }
}

fn predicate_condition(predicate: &Predicate) -> Condition {
    match predicate {
        Predicate::Equals { field, value } => Condition::all().add(column(*field).eq(bind(value))),
        Predicate::NotNull { field } => Condition::all().add(column(*field).is_not_null()),
        Predicate::ContainsIgnoreCase { fields, needle } => {
            fields.iter().fold(Condition::any(), |any, field| {
                any.add(Expr::col(search_column(*field)).like(contains_pattern(needle)))
            })
        }
    }
}

/// Translates a catalog descriptor into a filtered, ordered select. Paging
/// is applied by the caller so the same select can be counted.
pub fn select_for(descriptor: &QueryDescriptor) -> Select<Entity> {
    let condition = descriptor
        .predicates
        .iter()
        .fold(Condition::all(), |all, p| all.add(predicate_condition(p)));
    let order = match descriptor.order_by.direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    };
    Entity::find()
        .filter(condition)
        .order_by(column(descriptor.order_by.field), order)
        // stable paging across equal sort keys
        .order_by_asc(Column::Id)
}

/// One page of products plus the exact number of matches.
pub async fn list_by_descriptor(descriptor: &QueryDescriptor) -> anyhow::Result<(Vec<Product>, u64)> {
    list_on(conn(), descriptor).await
}

async fn list_on<C: ConnectionTrait>(
    db: &C,
    descriptor: &QueryDescriptor,
) -> anyhow::Result<(Vec<Product>, u64)> {
    let query = select_for(descriptor);
    let total = query.clone().count(db).await?;

    let models = query
        .limit(descriptor.limit)
        .offset(descriptor.offset)
        .all(db)
        .await?;

    Ok((products(models)?, total))
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<Product>> {
    let result = Entity::find_by_id(id.to_string()).one(conn()).await?;
    result.map(Product::try_from).transpose()
}

pub async fn get_by_slug(slug: &str) -> anyhow::Result<Option<Product>> {
    let result = Entity::find()
        .filter(Column::Slug.eq(slug))
        .one(conn())
        .await?;
    result.map(Product::try_from).transpose()
}

/// Whether another product already uses `slug`.
pub async fn slug_taken(slug: &str, except: Option<Uuid>) -> anyhow::Result<bool> {
    let mut query = Entity::find().filter(Column::Slug.eq(slug));
    if let Some(id) = except {
        query = query.filter(Column::Id.ne(id.to_string()));
    }
    Ok(query.count(conn()).await? > 0)
}

fn active_model(aggregate: &Product) -> anyhow::Result<ActiveModel> {
    Ok(ActiveModel {
        id: Set(aggregate.id.value().to_string()),
        title: Set(aggregate.title.clone()),
        slug: Set(aggregate.slug.clone()),
        brand: Set(aggregate.brand.clone()),
        title_search: Set(search_key(&aggregate.title)),
        brand_search: Set(search_key(&aggregate.brand)),
        description: Set(aggregate.description.clone()),
        department: Set(aggregate.department.clone()),
        category: Set(aggregate.category.clone()),
        subcategory: Set(aggregate.subcategory.clone()),
        price: Set(aggregate.price),
        discount_price: Set(aggregate.discount_price),
        variants: Set(serde_json::to_string(&aggregate.variants)?),
        specs: Set(aggregate.specs.clone()),
        is_active: Set(aggregate.is_active),
        created_at: Set(aggregate.metadata.created_at),
        updated_at: Set(aggregate.metadata.updated_at),
    })
}

pub async fn insert(aggregate: &Product) -> anyhow::Result<Uuid> {
    insert_on(conn(), aggregate).await
}

async fn insert_on<C: ConnectionTrait>(db: &C, aggregate: &Product) -> anyhow::Result<Uuid> {
    active_model(aggregate)?.insert(db).await?;
    Ok(aggregate.id.value())
}

pub async fn update(aggregate: &Product) -> anyhow::Result<()> {
    let mut active = active_model(aggregate)?;
    active.created_at = sea_orm::ActiveValue::NotSet;
    active.update(conn()).await?;
    Ok(())
}

pub async fn set_active(id: Uuid, is_active: bool) -> anyhow::Result<bool> {
    let result = Entity::update_many()
        .col_expr(Column::IsActive, Expr::value(is_active))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.to_string()))
        .exec(conn())
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn delete(id: Uuid) -> anyhow::Result<bool> {
    let result = Entity::delete_by_id(id.to_string()).exec(conn()).await?;
    Ok(result.rows_affected > 0)
}

/// `(all, active, active with a discount)`
pub async fn counts() -> anyhow::Result<(u64, u64, u64)> {
    let total = Entity::find().count(conn()).await?;
    let active = Entity::find()
        .filter(Column::IsActive.eq(true))
        .count(conn())
        .await?;
    let on_offer = Entity::find()
        .filter(Column::IsActive.eq(true))
        .filter(Column::DiscountPrice.is_not_null())
        .count(conn())
        .await?;
    Ok((total, active, on_offer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::catalog::CatalogQueryResolver;
    use contracts::domain::a001_product::aggregate::ProductDto;
    use contracts::domain::common::AggregateRoot;
    use sea_orm::{DbBackend, EntityName, QueryTrait, Statement, Value};
    use std::collections::HashMap;

    use crate::shared::data::db::connect_in_memory;

    fn descriptor_for(pairs: &[(&str, &str)]) -> QueryDescriptor {
        let params: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let resolver = CatalogQueryResolver::storefront();
        let state = resolver.parse(&params);
        resolver.to_query_descriptor(&state, 15)
    }

    fn statement_for(pairs: &[(&str, &str)]) -> Statement {
        let descriptor = descriptor_for(pairs);
        select_for(&descriptor)
            .limit(descriptor.limit)
            .offset(descriptor.offset)
            .build(DbBackend::Sqlite)
    }

    fn binds(stmt: &Statement, value: impl Into<Value>) -> bool {
        let value = value.into();
        stmt.values
            .as_ref()
            .map_or(false, |values| values.0.iter().any(|v| *v == value))
    }

    #[test]
    fn taxonomy_filters_become_equalities() {
        let stmt = statement_for(&[("dept", "Agua Dulce"), ("cat", "Carretes"), ("subcat", "Spinning")]);
        let sql = &stmt.sql;
        assert!(sql.contains(r#""a001_product"."is_active" = ?"#), "{sql}");
        assert!(sql.contains(r#""a001_product"."department" = ?"#), "{sql}");
        assert!(sql.contains(r#""a001_product"."category" = ?"#), "{sql}");
        assert!(sql.contains(r#""a001_product"."subcategory" = ?"#), "{sql}");
        assert!(sql.contains(r#"ORDER BY "a001_product"."created_at" DESC"#), "{sql}");
        assert!(binds(&stmt, "Agua Dulce"));
        assert!(binds(&stmt, "Carretes"));
        assert!(binds(&stmt, "Spinning"));
    }

    #[test]
    fn search_is_lowercased_and_or_joined() {
        let descriptor = descriptor_for(&[("q", "SHIMANO"), ("sort", "price_asc"), ("page", "2")]);
        assert_eq!((descriptor.offset, descriptor.limit), (15, 15));

        let stmt = statement_for(&[("q", "SHIMANO"), ("sort", "price_asc"), ("page", "2")]);
        let sql = &stmt.sql;
        assert!(sql.contains(r#""title_search" LIKE ?"#), "{sql}");
        assert!(sql.contains(" OR "), "{sql}");
        assert!(sql.contains(r#""brand_search" LIKE ?"#), "{sql}");
        assert!(sql.contains(r#"ORDER BY "a001_product"."price" ASC"#), "{sql}");
        assert!(binds(&stmt, "%shimano%"));
        assert!(!binds(&stmt, "%SHIMANO%"));
    }

    #[test]
    fn offers_require_discount_price() {
        let sql = statement_for(&[("sort", "ofertas")]).sql;
        assert!(sql.contains(r#""a001_product"."discount_price" IS NOT NULL"#), "{sql}");
    }

    #[test]
    fn like_wildcards_in_search_are_escaped() {
        let stmt = statement_for(&[("q", "100%_x")]);
        assert!(stmt.sql.contains("ESCAPE"), "{}", stmt.sql);
        assert!(binds(&stmt, r"%100\%\_x%"));
    }

    #[test]
    fn entity_table_matches_aggregate() {
        assert_eq!(Entity.table_name(), Product::table_name());
    }

    #[test]
    fn rows_with_invalid_ids_are_rejected() {
        let now = Utc::now();
        let model = Model {
            id: "not-a-uuid".into(),
            title: "Carrete".into(),
            slug: "carrete".into(),
            brand: "Shimano".into(),
            title_search: "carrete".into(),
            brand_search: "shimano".into(),
            description: String::new(),
            department: "Agua Dulce".into(),
            category: "Carretes".into(),
            subcategory: "Spinning".into(),
            price: 10.0,
            discount_price: None,
            variants: "[]".into(),
            specs: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert!(Product::try_from(model.clone()).is_err());

        let valid = Model {
            id: Uuid::new_v4().to_string(),
            ..model
        };
        assert!(Product::try_from(valid).is_ok());
    }

    fn fixture(title: &str, brand: &str) -> Product {
        let dto = ProductDto {
            title: title.into(),
            brand: brand.into(),
            department: "Agua Dulce".into(),
            category: "Señuelos".into(),
            subcategory: "Plásticos".into(),
            price: 120.0,
            ..ProductDto::default()
        };
        Product::new_for_insert(&dto, search_key(title).replace(' ', "-"))
    }

    #[tokio::test]
    async fn search_matches_accented_capitals() {
        let db = connect_in_memory().await.unwrap();
        insert_on(&db, &fixture("Señuelo ÁGUILA", "Ñandú")).await.unwrap();
        insert_on(&db, &fixture("Carrete Sedona", "Shimano")).await.unwrap();

        for q in ["ÁGUILA", "águila", "Ñandú", "ñANDÚ", "Señuelo"] {
            let (items, total) = list_on(&db, &descriptor_for(&[("q", q)])).await.unwrap();
            assert_eq!(total, 1, "q={q}");
            assert_eq!(items[0].title, "Señuelo ÁGUILA");
        }

        let (_, total) = list_on(&db, &descriptor_for(&[("q", "sedona")])).await.unwrap();
        assert_eq!(total, 1);
    }
}
