//! Rating endpoints.
//!
//! - `POST /api/v1/ratings` - Rate a toilet (1-5, once per user)
//! - `GET|PUT|DELETE /api/v1/ratings/{id}`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{CreateRatingRequest, DeleteResponse, RatingResponse, UpdateRatingRequest};
use crate::state::AppState;

async fn create_rating(
    State(state): State<AppState>,
    Json(request): Json<CreateRatingRequest>,
) -> Result<(StatusCode, Json<RatingResponse>)> {
    let rating = state.ratings.create(request)?;
    Ok((StatusCode::CREATED, Json(rating)))
}

async fn get_rating(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RatingResponse>> {
    Ok(Json(state.ratings.get(id)?))
}

async fn update_rating(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRatingRequest>,
) -> Result<Json<RatingResponse>> {
    Ok(Json(state.ratings.update(id, request)?))
}

async fn delete_rating(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>> {
    state.ratings.delete(id)?;
    Ok(Json(DeleteResponse::new("Rating", id)))
}

/// Create rating routes
pub fn rating_routes() -> Router<AppState> {
    Router::new().route("/", post(create_rating)).route(
        "/{id}",
        get(get_rating).put(update_rating).delete(delete_rating),
    )
}
