use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::auth::{hash_password, validate_password_strength};
use crate::database::manager::DatabaseError;
use crate::database::models::UserAccount;
use crate::database::service::{find_user_by_id, insert_user};
use crate::todo::validate::{is_valid_email, ValidationErrors};

/// Request body for account registration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserRegistration {
    pub user_email: String,
    pub user_password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("User not found")]
    NotFound { id: i64 },
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Database manager error: {0}")]
    Database(#[from] DatabaseError),
}

pub struct UserService {
    pool: SqlitePool,
    min_password_length: usize,
}

impl UserService {
    pub fn new(pool: SqlitePool, min_password_length: usize) -> Self {
        Self {
            pool,
            min_password_length,
        }
    }

    /// Validate, hash the password and store a new account
    pub async fn register(&self, registration: UserRegistration) -> Result<UserAccount, UserError> {
        self.validate(&registration)?;

        let UserRegistration {
            user_email,
            user_password,
        } = registration;

        // Hashing is CPU-bound; run it on the blocking pool
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&user_password))
            .await
            .map_err(|e| UserError::Hashing(e.to_string()))?
            .map_err(|e| UserError::Hashing(e.to_string()))?;

        let row = insert_user(&self.pool, &user_email, &password_hash).await?;
        info!(user_id = row.id, "registered user");
        Ok(row.into())
    }

    pub async fn get(&self, id: i64) -> Result<UserAccount, UserError> {
        find_user_by_id(&self.pool, id)
            .await?
            .map(UserAccount::from)
            .ok_or(UserError::NotFound { id })
    }

    fn validate(&self, registration: &UserRegistration) -> Result<(), UserError> {
        let mut errors = ValidationErrors::new();

        if !is_valid_email(&registration.user_email) {
            errors.add("user_email", "value is not a valid email address");
        }
        if let Err(msg) = validate_password_strength(&registration.user_password, self.min_password_length) {
            errors.add("user_password", msg);
        }

        errors.into_result().map_err(UserError::Validation)
    }
}
