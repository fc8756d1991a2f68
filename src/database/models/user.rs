use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// One row of the `users` table. The password column only ever holds a PHC hash.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub user_email: String,
    pub user_password: String,
    pub created_at: DateTime<Utc>,
}

/// Public view of a user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAccount {
    pub id: i64,
    pub user_email: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for UserAccount {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            user_email: row.user_email,
            created_at: row.created_at,
        }
    }
}
