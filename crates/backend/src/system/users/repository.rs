use anyhow::{Context, Result};
use contracts::system::users::{User, UserRole};
use sea_orm::{ConnectionTrait, DatabaseBackend, QueryResult, Statement, Value};

use crate::shared::data::db::get_connection;

const USER_COLUMNS: &str =
    "id, email, full_name, role, is_active, created_at, updated_at, last_login_at";

fn user_from_row(row: &QueryResult) -> Result<User> {
    let role: String = row.try_get("", "role")?;
    Ok(User {
        id: row.try_get("", "id")?,
        email: row.try_get("", "email")?,
        full_name: row.try_get("", "full_name")?,
        role: UserRole::from_param(&role).unwrap_or(UserRole::Client),
        is_active: row.try_get::<i32>("", "is_active")? != 0,
        created_at: row.try_get("", "created_at")?,
        updated_at: row.try_get("", "updated_at")?,
        last_login_at: row.try_get("", "last_login_at")?,
    })
}

/// Create user with password hash
pub async fn create_with_password(user: &User, password_hash: &str) -> Result<()> {
    get_connection()
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "INSERT INTO sys_users (id, email, password_hash, full_name, role, is_active, created_at, updated_at, last_login_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            [
                user.id.clone().into(),
                user.email.clone().into(),
                password_hash.to_string().into(),
                user.full_name.clone().into(),
                user.role.as_str().into(),
                (if user.is_active { 1 } else { 0 }).into(),
                user.created_at.clone().into(),
                user.updated_at.clone().into(),
                user.last_login_at.clone().into(),
            ],
        ))
        .await
        .context("Failed to insert user")?;
    Ok(())
}

async fn query_one_user(sql: String, values: Vec<Value>) -> Result<Option<User>> {
    let row = get_connection()
        .query_one(Statement::from_sql_and_values(DatabaseBackend::Sqlite, sql, values))
        .await?;
    row.as_ref().map(user_from_row).transpose()
}

pub async fn get_by_id(id: &str) -> Result<Option<User>> {
    query_one_user(
        format!("SELECT {} FROM sys_users WHERE id = ?", USER_COLUMNS),
        vec![id.into()],
    )
    .await
}

/// Emails are compared case-insensitively.
pub async fn get_by_email(email: &str) -> Result<Option<User>> {
    query_one_user(
        format!("SELECT {} FROM sys_users WHERE LOWER(email) = LOWER(?)", USER_COLUMNS),
        vec![email.trim().into()],
    )
    .await
}

pub async fn get_password_hash(user_id: &str) -> Result<Option<String>> {
    let result = get_connection()
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT password_hash FROM sys_users WHERE id = ?",
            [user_id.into()],
        ))
        .await?;

    match result {
        Some(row) => Ok(Some(row.try_get("", "password_hash")?)),
        None => Ok(None),
    }
}

/// SQL and values for the admin user list.
fn list_statement(search: Option<&str>, role: Option<UserRole>) -> (String, Vec<Value>) {
    let mut sql = format!("SELECT {} FROM sys_users WHERE 1 = 1", USER_COLUMNS);
    let mut values: Vec<Value> = Vec::new();

    if let Some(text) = search.map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", text.to_lowercase());
        sql.push_str(" AND (LOWER(email) LIKE ? OR LOWER(COALESCE(full_name, '')) LIKE ?)");
        values.push(pattern.clone().into());
        values.push(pattern.into());
    }
    if let Some(role) = role {
        sql.push_str(" AND role = ?");
        values.push(role.as_str().into());
    }
    sql.push_str(" ORDER BY created_at DESC");
    (sql, values)
}

pub async fn list(search: Option<&str>, role: Option<UserRole>) -> Result<Vec<User>> {
    let (sql, values) = list_statement(search, role);
    let rows = get_connection()
        .query_all(Statement::from_sql_and_values(DatabaseBackend::Sqlite, sql, values))
        .await?;
    rows.iter().map(user_from_row).collect()
}

pub async fn update(user: &User) -> Result<()> {
    get_connection()
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "UPDATE sys_users SET full_name = ?, role = ?, is_active = ?, updated_at = ? WHERE id = ?",
            [
                user.full_name.clone().into(),
                user.role.as_str().into(),
                (if user.is_active { 1 } else { 0 }).into(),
                user.updated_at.clone().into(),
                user.id.clone().into(),
            ],
        ))
        .await
        .context("Failed to update user")?;
    Ok(())
}

/// Hard delete; refresh tokens go with the row.
pub async fn delete(id: &str) -> Result<bool> {
    let conn = get_connection();
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "DELETE FROM sys_refresh_tokens WHERE user_id = ?",
        [id.into()],
    ))
    .await
    .context("Failed to delete refresh tokens")?;

    let result = conn
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "DELETE FROM sys_users WHERE id = ?",
            [id.into()],
        ))
        .await
        .context("Failed to delete user")?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_last_login(id: &str) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    get_connection()
        .execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "UPDATE sys_users SET last_login_at = ? WHERE id = ?",
            [now.into(), id.to_string().into()],
        ))
        .await
        .context("Failed to update last login")?;
    Ok(())
}

async fn count_where(sql: &str, values: Vec<Value>) -> Result<u64> {
    let result = get_connection()
        .query_one(Statement::from_sql_and_values(DatabaseBackend::Sqlite, sql, values))
        .await?;
    match result {
        Some(row) => Ok(row.try_get::<i64>("", "count")?.max(0) as u64),
        None => Ok(0),
    }
}

pub async fn count_users() -> Result<u64> {
    count_where("SELECT COUNT(*) AS count FROM sys_users", vec![]).await
}

pub async fn count_by_role(role: UserRole) -> Result<u64> {
    count_where(
        "SELECT COUNT(*) AS count FROM sys_users WHERE role = ?",
        vec![role.as_str().into()],
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_without_filters_has_no_bindings() {
        let (sql, values) = list_statement(Some("   "), None);
        assert!(values.is_empty());
        assert!(sql.ends_with("WHERE 1 = 1 ORDER BY created_at DESC"));
    }

    #[test]
    fn list_filters_by_name_email_and_role() {
        let (sql, values) = list_statement(Some("Ana"), Some(UserRole::Admin));
        assert!(sql.contains("LOWER(email) LIKE ?"));
        assert!(sql.contains("AND role = ?"));
        assert_eq!(values.len(), 3);
        assert_eq!(values[0], Value::from("%ana%".to_string()));
        assert_eq!(values[2], Value::from("admin"));
    }
}
