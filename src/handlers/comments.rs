//! Comment endpoints.
//!
//! Comment text may be sent percent-encoded; it is decoded before storage.
//!
//! ## Endpoints
//!
//! - `POST /api/v1/comments` - Create a comment and link it to its toilet
//! - `GET /api/v1/comments?toiletId=` - Comments of a toilet
//! - `GET|PUT /api/v1/comments/{id}`
//! - `DELETE /api/v1/comments/{id}` - Also unlinks the comment from its toilet

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use super::sequence;
use crate::error::Result;
use crate::models::{
    CommentListQuery, CommentResponse, CreateCommentRequest, DeleteResponse, UpdateCommentRequest,
};
use crate::state::AppState;

async fn create_comment(
    State(state): State<AppState>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>)> {
    let comment = state.comments.create_and_link(request)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<CommentListQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    let comments = state.comments.get_comments(query.toilet_id)?;
    sequence::respond(&headers, comments).await
}

async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CommentResponse>> {
    Ok(Json(state.comments.get(id)?))
}

async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>> {
    Ok(Json(state.comments.update(id, request)?))
}

async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>> {
    state.comments.delete_and_remove(id)?;
    Ok(Json(DeleteResponse::new("Comment", id)))
}

/// Create comment routes
pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_comments).post(create_comment))
        .route(
            "/{id}",
            get(get_comment).put(update_comment).delete(delete_comment),
        )
}
