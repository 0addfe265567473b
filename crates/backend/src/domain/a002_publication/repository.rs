use contracts::domain::a002_publication::aggregate::{Publication, PublicationId, PublicationType};
use contracts::domain::common::EntityMetadata;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set};

use crate::shared::data::db::get_connection;
use crate::shared::data::search::{contains_pattern, search_key};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a002_publication")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub slug: String,
    pub title_search: String,
    pub description: String,
    pub image_url: String,
    pub publication_type: String,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Publication {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let uuid = Uuid::parse_str(&m.id)
            .map_err(|e| anyhow::anyhow!("Publication row has invalid id {:?}: {}", m.id, e))?;
        let publication_type = PublicationType::from_param(&m.publication_type).unwrap_or_else(|| {
            tracing::warn!("Publication {} has unknown type {:?}", m.id, m.publication_type);
            PublicationType::Anuncio
        });

        Ok(Publication {
            id: PublicationId(uuid),
            title: m.title,
            slug: m.slug,
            description: m.description,
            image_url: m.image_url,
            publication_type,
            is_active: m.is_active,
            metadata: EntityMetadata::with_timestamps(m.created_at, m.updated_at),
        })
    }
}

fn publications(models: Vec<Model>) -> anyhow::Result<Vec<Publication>> {
    models.into_iter().map(Publication::try_from).collect()
}

fn conn() -> &'static DatabaseConnection {
    get_connection()
}

/// Active publications, newest first.
pub async fn list_active() -> anyhow::Result<Vec<Publication>> {
    let items = Entity::find()
        .filter(Column::IsActive.eq(true))
        .order_by_desc(Column::CreatedAt)
        .all(conn())
        .await?;
    publications(items)
}

pub fn home_feed_select(limit: u64) -> Select<Entity> {
    Entity::find()
        .filter(Column::IsActive.eq(true))
        .order_by_asc(Column::PublicationType)
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
}

/// Home page strip: announcements before raffles, newest first within each.
pub async fn home_feed(limit: u64) -> anyhow::Result<Vec<Publication>> {
    let items = home_feed_select(limit)
        .all(conn())
        .await?;
    publications(items)
}

pub fn admin_select(search: Option<&str>, publication_type: Option<PublicationType>) -> Select<Entity> {
    let mut query = Entity::find();
    if let Some(text) = search.map(str::trim).filter(|s| !s.is_empty()) {
        query = query.filter(Expr::col(Column::TitleSearch).like(contains_pattern(text)));
    }
    if let Some(kind) = publication_type {
        query = query.filter(Column::PublicationType.eq(kind.as_str()));
    }
    query.order_by_desc(Column::CreatedAt)
}

pub async fn list_admin(
    search: Option<&str>,
    publication_type: Option<PublicationType>,
) -> anyhow::Result<Vec<Publication>> {
    let items = admin_select(search, publication_type)
        .all(conn())
        .await?;
    publications(items)
}

pub async fn get_by_id(id: Uuid) -> anyhow::Result<Option<Publication>> {
    let result = Entity::find_by_id(id.to_string()).one(conn()).await?;
    result.map(Publication::try_from).transpose()
}

pub async fn get_by_slug(slug: &str) -> anyhow::Result<Option<Publication>> {
    let result = Entity::find()
        .filter(Column::Slug.eq(slug))
        .one(conn())
        .await?;
    result.map(Publication::try_from).transpose()
}

pub async fn slug_taken(slug: &str, except: Option<Uuid>) -> anyhow::Result<bool> {
    let mut query = Entity::find().filter(Column::Slug.eq(slug));
    if let Some(id) = except {
        query = query.filter(Column::Id.ne(id.to_string()));
    }
    Ok(query.count(conn()).await? > 0)
}

fn active_model(aggregate: &Publication) -> ActiveModel {
    ActiveModel {
        id: Set(aggregate.id.value().to_string()),
        title: Set(aggregate.title.clone()),
        slug: Set(aggregate.slug.clone()),
        title_search: Set(search_key(&aggregate.title)),
        description: Set(aggregate.description.clone()),
        image_url: Set(aggregate.image_url.clone()),
        publication_type: Set(aggregate.publication_type.as_str().to_string()),
        is_active: Set(aggregate.is_active),
        created_at: Set(aggregate.metadata.created_at),
        updated_at: Set(aggregate.metadata.updated_at),
    }
}

pub async fn insert(aggregate: &Publication) -> anyhow::Result<Uuid> {
    active_model(aggregate).insert(conn()).await?;
    Ok(aggregate.id.value())
}

pub async fn update(aggregate: &Publication) -> anyhow::Result<()> {
    let mut active = active_model(aggregate);
    active.created_at = sea_orm::ActiveValue::NotSet;
    active.update(conn()).await?;
    Ok(())
}

pub async fn delete(id: Uuid) -> anyhow::Result<bool> {
    let result = Entity::delete_by_id(id.to_string()).exec(conn()).await?;
    Ok(result.rows_affected > 0)
}

/// `(all, active raffles)`
pub async fn counts() -> anyhow::Result<(u64, u64)> {
    let total = Entity::find().count(conn()).await?;
    let raffles = Entity::find()
        .filter(Column::IsActive.eq(true))
        .filter(Column::PublicationType.eq(PublicationType::Sorteo.as_str()))
        .count(conn())
        .await?;
    Ok((total, raffles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::domain::common::AggregateRoot;
    use sea_orm::{DbBackend, EntityName, QueryTrait, Value};

    #[test]
    fn home_feed_orders_by_type_then_newest() {
        let sql = home_feed_select(6).build(DbBackend::Sqlite).sql;
        assert!(
            sql.contains(r#"ORDER BY "a002_publication"."publication_type" ASC, "a002_publication"."created_at" DESC"#),
            "{sql}"
        );
        assert!(sql.contains("LIMIT ?"), "{sql}");
    }

    #[test]
    fn admin_filters_are_optional() {
        let all = admin_select(Some("  "), None).build(DbBackend::Sqlite);
        assert!(!all.sql.contains("WHERE"), "{}", all.sql);

        let filtered = admin_select(Some("Gran SORTEO"), Some(PublicationType::Sorteo)).build(DbBackend::Sqlite);
        assert!(filtered.sql.contains(r#""title_search" LIKE ?"#), "{}", filtered.sql);
        assert!(filtered.sql.contains(r#""a002_publication"."publication_type" = ?"#), "{}", filtered.sql);
        let values = filtered.values.map(|v| v.0).unwrap_or_default();
        assert!(values.contains(&Value::from("%gran sorteo%")), "{values:?}");
        assert!(values.contains(&Value::from("sorteo")), "{values:?}");
    }

    #[test]
    fn admin_search_escapes_wildcards() {
        let stmt = admin_select(Some("50%_off"), None).build(DbBackend::Sqlite);
        assert!(stmt.sql.contains("ESCAPE"), "{}", stmt.sql);
        let values = stmt.values.map(|v| v.0).unwrap_or_default();
        assert!(values.contains(&Value::from(r"%50\%\_off%")), "{values:?}");
    }

    #[test]
    fn entity_table_matches_aggregate() {
        assert_eq!(Entity.table_name(), Publication::table_name());
    }

    #[test]
    fn rows_with_invalid_ids_are_rejected() {
        let now = chrono::Utc::now();
        let model = Model {
            id: "broken".into(),
            title: "Gran Sorteo".into(),
            slug: "gran-sorteo".into(),
            title_search: "gran sorteo".into(),
            description: "Gana".into(),
            image_url: "https://res.cloudinary.com/demo/image/upload/b.jpg".into(),
            publication_type: "sorteo".into(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert!(Publication::try_from(model).is_err());
    }
}
