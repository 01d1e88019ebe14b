//! Minimal user management.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{CreateUserRequest, User, UserResponse};
use crate::services::DatabaseService;

#[derive(Debug, Clone)]
pub struct UserService {
    db: Arc<DatabaseService>,
}

impl UserService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    pub fn create(&self, request: CreateUserRequest) -> Result<UserResponse> {
        let user = User::new(request)?;
        self.db.insert_user(&user)?;

        info!(id = %user.id, "Created user");
        Ok(UserResponse::from(&user))
    }

    pub fn get(&self, id: Uuid) -> Result<UserResponse> {
        let user = self.db.get_user(id)?.ok_or(AppError::UserNotFound(id))?;
        Ok(UserResponse::from(&user))
    }

    /// Lookup by email, case-insensitive
    pub fn find_by_email(&self, email: &str) -> Result<UserResponse> {
        let user = self
            .db
            .find_user_by_email(email)?
            .ok_or_else(|| AppError::UnknownEmail(email.to_string()))?;
        Ok(UserResponse::from(&user))
    }
}
