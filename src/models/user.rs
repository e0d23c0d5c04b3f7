use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{AppError, AppResult};

/// An account that owns library entries and watchlists
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    /// Stored as provided. Never serialized into responses.
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for user creation
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl CreateUserRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err(AppError::InvalidInput(
                "A valid email is required".to_string(),
            ));
        }
        if self.username.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Username cannot be empty".to_string(),
            ));
        }
        if self.password.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Password cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
