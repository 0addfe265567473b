use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};
#[cfg(test)]
use sea_orm::ConnectOptions;

use crate::shared::config;

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Tables and indexes created on startup when missing.
const SCHEMA: &[(&str, &str)] = &[
    (
        "a001_product",
        r#"
        CREATE TABLE IF NOT EXISTS a001_product (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            slug TEXT NOT NULL,
            brand TEXT NOT NULL,
            title_search TEXT NOT NULL DEFAULT '',
            brand_search TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            department TEXT NOT NULL,
            category TEXT NOT NULL,
            subcategory TEXT NOT NULL,
            price REAL NOT NULL,
            discount_price REAL,
            variants TEXT NOT NULL DEFAULT '[]',
            specs TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    ),
    (
        "idx_a001_product_slug",
        "CREATE INDEX IF NOT EXISTS idx_a001_product_slug ON a001_product (slug);",
    ),
    (
        "idx_a001_product_taxonomy",
        "CREATE INDEX IF NOT EXISTS idx_a001_product_taxonomy \
         ON a001_product (department, category, subcategory);",
    ),
    (
        "a002_publication",
        r#"
        CREATE TABLE IF NOT EXISTS a002_publication (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            slug TEXT NOT NULL,
            title_search TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL,
            image_url TEXT NOT NULL,
            publication_type TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    ),
    (
        "idx_a002_publication_slug",
        "CREATE INDEX IF NOT EXISTS idx_a002_publication_slug ON a002_publication (slug);",
    ),
    (
        "sys_users",
        r#"
        CREATE TABLE IF NOT EXISTS sys_users (
            id TEXT PRIMARY KEY NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            full_name TEXT,
            role TEXT NOT NULL DEFAULT 'client',
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            last_login_at TEXT
        );
        "#,
    ),
    (
        "sys_refresh_tokens",
        r#"
        CREATE TABLE IF NOT EXISTS sys_refresh_tokens (
            id TEXT PRIMARY KEY NOT NULL,
            user_id TEXT NOT NULL,
            token_hash TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            revoked_at TEXT,
            FOREIGN KEY (user_id) REFERENCES sys_users (id) ON DELETE CASCADE
        );
        "#,
    ),
    (
        "idx_sys_refresh_tokens_hash",
        "CREATE INDEX IF NOT EXISTS idx_sys_refresh_tokens_hash ON sys_refresh_tokens (token_hash);",
    ),
    (
        "sys_settings",
        r#"
        CREATE TABLE IF NOT EXISTS sys_settings (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    ),
];

/// Opens the SQLite database named in the configuration and makes sure every
/// table exists.
pub async fn initialize_database() -> anyhow::Result<()> {
    let db_file = config::get_database_path(config::get())?;
    if let Some(parent) = db_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if db_file.is_absolute() {
        db_file
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    tracing::info!("Opening database {}", normalized);
    let conn = Database::connect(&db_url).await?;
    apply_schema(&conn).await?;

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    Ok(())
}

async fn apply_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    for (name, sql) in SCHEMA {
        conn.execute(Statement::from_string(DatabaseBackend::Sqlite, sql.to_string()))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {}", name, e))?;
        tracing::debug!("Schema object ready: {}", name);
    }
    tracing::info!("Database schema ready ({} objects)", SCHEMA.len());
    Ok(())
}

/// Private in-memory database with the full schema, for repository tests.
#[cfg(test)]
pub async fn connect_in_memory() -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1).sqlx_logging(false);
    let conn = Database::connect(options).await?;
    apply_schema(&conn).await?;
    Ok(conn)
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_is_created_idempotently() {
        for (name, sql) in SCHEMA {
            assert!(sql.contains("IF NOT EXISTS"), "{name} must be idempotent");
            assert!(sql.contains(name), "{name} statement names its object");
        }
    }
}
