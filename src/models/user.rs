//! User document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(request: CreateUserRequest) -> Result<Self> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("name must not be empty"));
        }

        let email = normalize_email(&request.email);
        let valid = email
            .split_once('@')
            .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
            .unwrap_or(false);
        if !valid {
            return Err(AppError::validation(format!(
                "'{}' is not a valid email address",
                request.email
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email,
            created_at: Utc::now(),
        })
    }
}

/// Emails are compared case-insensitively
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserLookupQuery {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_validation() {
        let ok = User::new(CreateUserRequest {
            name: " Alice ".to_string(),
            email: "Alice@Example.org".to_string(),
        })
        .unwrap();
        assert_eq!(ok.name, "Alice");
        assert_eq!(ok.email, "alice@example.org");

        assert!(User::new(CreateUserRequest {
            name: "".to_string(),
            email: "a@b.c".to_string(),
        })
        .is_err());
        assert!(User::new(CreateUserRequest {
            name: "Bob".to_string(),
            email: "not-an-email".to_string(),
        })
        .is_err());
    }
}
