use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::manager::DatabaseError;
use crate::database::models::UserRow;

const SELECT_USERS: &str = "SELECT id, user_email, user_password, created_at FROM users";

/// Insert a user with an already-hashed password
pub async fn insert_user(pool: &SqlitePool, email: &str, password_hash: &str) -> Result<UserRow, DatabaseError> {
    let created_at = Utc::now();

    let result = sqlx::query("INSERT INTO users (user_email, user_password, created_at) VALUES (?, ?, ?)")
        .bind(email)
        .bind(password_hash)
        .bind(created_at)
        .execute(pool)
        .await;

    match result {
        Ok(done) => find_user_by_id(pool, done.last_insert_rowid())
            .await?
            .ok_or_else(|| DatabaseError::NotFound("inserted user vanished".to_string())),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(DatabaseError::Conflict(
            format!("user with email {} already exists", email),
        )),
        Err(other) => Err(other.into()),
    }
}

pub async fn find_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<UserRow>, DatabaseError> {
    let user = sqlx::query_as::<_, UserRow>(&format!("{} WHERE id = ?", SELECT_USERS))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Email comparison is case-insensitive (column collation)
pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<UserRow>, DatabaseError> {
    let user = sqlx::query_as::<_, UserRow>(&format!("{} WHERE user_email = ?", SELECT_USERS))
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}
