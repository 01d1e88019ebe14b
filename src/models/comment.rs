//! Comment document and its DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Comment document as stored in the `comments` column family.
///
/// Ownership lives on the toilet side: a toilet lists the ids of its
/// comments in `Toilet::comment_ids`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn new(user_id: Uuid, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            text,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn edit(&mut self, text: String) {
        self.text = text;
        self.updated_at = Some(Utc::now());
    }
}

/// Percent-decode comment text sent by clients and enforce length limits
pub fn decode_text(raw: &str, max_length: usize) -> Result<String> {
    let decoded = urlencoding::decode(raw)
        .map_err(|e| AppError::validation(format!("comment text is not valid UTF-8: {}", e)))?;
    let text = decoded.trim();

    if text.is_empty() {
        return Err(AppError::validation("comment text must not be empty"));
    }
    if text.chars().count() > max_length {
        return Err(AppError::validation(format!(
            "comment text must be at most {} characters",
            max_length
        )));
    }
    Ok(text.to_string())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub toilet_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCommentRequest {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentListQuery {
    pub toilet_id: Uuid,
}

/// Comment joined with the author's display name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CommentResponse {
    pub fn assemble(comment: &Comment, user_name: Option<String>) -> Self {
        Self {
            id: comment.id,
            user_id: comment.user_id,
            user_name,
            text: comment.text.clone(),
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text() {
        assert_eq!(decode_text("Very%20clean%21", 100).unwrap(), "Very clean!");
        assert_eq!(decode_text("plain text", 100).unwrap(), "plain text");
        assert_eq!(decode_text("%C3%BCber", 100).unwrap(), "über");
    }

    #[test]
    fn test_decode_rejects_empty_and_long() {
        assert!(decode_text("%20%20", 100).is_err());
        assert!(decode_text("abcdef", 5).is_err());
        assert!(decode_text("%FF%FE", 100).is_err());
    }

    #[test]
    fn test_edit_sets_updated_at() {
        let mut comment = Comment::new(Uuid::new_v4(), "first".to_string());
        assert!(comment.updated_at.is_none());
        comment.edit("second".to_string());
        assert_eq!(comment.text, "second");
        assert!(comment.updated_at.is_some());
    }
}
