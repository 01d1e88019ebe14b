//! Comment service.

use futures::future;
use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    decode_text, Comment, CommentResponse, CreateCommentRequest, UpdateCommentRequest,
};
use crate::services::DatabaseService;

#[derive(Debug, Clone)]
pub struct CommentService {
    db: Arc<DatabaseService>,
    max_length: usize,
}

impl CommentService {
    pub fn new(db: Arc<DatabaseService>, max_length: usize) -> Self {
        Self { db, max_length }
    }

    /// Create a comment and append it to the toilet's comment list
    pub fn create_and_link(&self, request: CreateCommentRequest) -> Result<CommentResponse> {
        let user = self
            .db
            .get_user(request.user_id)?
            .ok_or(AppError::UserNotFound(request.user_id))?;
        let text = decode_text(&request.text, self.max_length)?;

        let comment = Comment::new(user.id, text);
        self.db.insert_comment_linked(&comment, request.toilet_id)?;

        info!(id = %comment.id, toilet_id = %request.toilet_id, user_id = %user.id, "Created comment");
        Ok(CommentResponse::assemble(&comment, Some(user.name)))
    }

    pub fn get(&self, id: Uuid) -> Result<CommentResponse> {
        let comment = self.find(id)?;
        join_user(&self.db, comment)
    }

    pub fn update(&self, id: Uuid, request: UpdateCommentRequest) -> Result<CommentResponse> {
        let text = decode_text(&request.text, self.max_length)?;
        let comment = self.db.update_comment(id, |comment| comment.edit(text))?;

        info!(id = %id, "Updated comment");
        join_user(&self.db, comment)
    }

    /// Comments of a toilet in the order they were linked.
    ///
    /// References to comments that no longer exist are skipped.
    pub fn get_comments(
        &self,
        toilet_id: Uuid,
    ) -> Result<impl Stream<Item = Result<CommentResponse>> + Send + 'static> {
        let toilet = self
            .db
            .get_toilet(toilet_id)?
            .ok_or(AppError::ToiletNotFound(toilet_id))?;
        let db = Arc::clone(&self.db);

        Ok(stream::iter(toilet.comment_ids).filter_map(move |id| {
            let item = match db.get_comment(id) {
                Ok(Some(comment)) => Some(join_user(&db, comment)),
                Ok(None) => {
                    warn!(toilet_id = %toilet_id, comment_id = %id, "Dangling comment reference");
                    None
                }
                Err(e) => Some(Err(e)),
            };
            future::ready(item)
        }))
    }

    /// Delete the comment record only
    pub fn delete(&self, id: Uuid) -> Result<()> {
        if !self.db.delete_comment(id)? {
            return Err(AppError::CommentNotFound(id));
        }
        info!(id = %id, "Deleted comment");
        Ok(())
    }

    /// Delete the comment and remove it from every toilet referencing it
    pub fn delete_and_remove(&self, id: Uuid) -> Result<()> {
        if !self.db.delete_comment_and_unlink(id)? {
            return Err(AppError::CommentNotFound(id));
        }
        info!(id = %id, "Deleted and unlinked comment");
        Ok(())
    }

    fn find(&self, id: Uuid) -> Result<Comment> {
        self.db.get_comment(id)?.ok_or(AppError::CommentNotFound(id))
    }
}

/// Attach the author's name; a deleted author leaves it empty
fn join_user(db: &DatabaseService, comment: Comment) -> Result<CommentResponse> {
    let user_name = db.get_user(comment.user_id)?.map(|u| u.name);
    Ok(CommentResponse::assemble(&comment, user_name))
}
