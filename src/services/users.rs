use std::sync::Arc;

use chrono::Utc;

use crate::{
    db::UserStore,
    error::{AppError, AppResult},
    models::{CreateUserRequest, NewUser, User},
};

/// Service for account creation and lookup
pub struct UserService {
    users: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Create an account, rejecting duplicate emails and usernames
    ///
    /// The store's unique constraints backstop these checks under concurrent
    /// signups.
    pub async fn create(&self, request: CreateUserRequest) -> AppResult<User> {
        if self.users.email_taken(&request.email).await? {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }
        if self.users.username_taken(&request.username).await? {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }

        let user = self
            .users
            .insert(NewUser {
                email: request.email,
                username: request.username,
                password: request.password,
                created_at: Utc::now(),
            })
            .await?;

        tracing::info!(user_id = user.id, "Created user");

        Ok(user)
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.users.find_all().await
    }

    pub async fn get(&self, id: i64) -> AppResult<User> {
        self.users
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn service() -> UserService {
        UserService::new(Arc::new(MemoryStore::new()))
    }

    fn request(email: &str, username: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.to_string(),
            username: username.to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let service = service();
        let created = service.create(request("ada@example.com", "ada")).await.unwrap();

        let fetched = service.get(created.id).await.unwrap();
        assert_eq!(fetched.email, "ada@example.com");
        assert_eq!(fetched.username, "ada");
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let service = service();
        service.create(request("ada@example.com", "ada")).await.unwrap();

        let err = service
            .create(request("ada@example.com", "someone_else"))
            .await
            .unwrap_err();
        match err {
            AppError::Conflict(message) => assert_eq!(message, "Email already exists"),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let service = service();
        service.create(request("ada@example.com", "ada")).await.unwrap();

        let err = service
            .create(request("other@example.com", "ada"))
            .await
            .unwrap_err();
        match err {
            AppError::Conflict(message) => assert_eq!(message, "Username already exists"),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_unknown_user() {
        let err = service().get(42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_returns_creation_order() {
        let service = service();
        service.create(request("a@example.com", "a")).await.unwrap();
        service.create(request("b@example.com", "b")).await.unwrap();

        let usernames: Vec<String> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|user| user.username)
            .collect();
        assert_eq!(usernames, vec!["a", "b"]);
    }
}
