//! Toilet endpoints.
//!
//! ## Endpoints
//!
//! - `GET /api/v1/toilets` - Nearby search (`lon`, `lat`, `radiusInKm` or
//!   `radiusInMiles`, `maxToiletsToLoad`); without a position the newest
//!   toilets are listed
//! - `POST /api/v1/toilets` - Create a toilet
//! - `GET|PUT|DELETE /api/v1/toilets/{id}`
//! - `GET /api/v1/toilets/{id}/comments` - Comments of a toilet
//! - `GET /api/v1/toilets/{id}/rating` - Average rating
//!
//! # Example
//!
//! ```bash
//! curl "http://localhost:3000/api/v1/toilets?lon=13.4&lat=52.5&radiusInKm=2&maxToiletsToLoad=10"
//! ```

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
    CreateToiletRequest, DeleteResponse, NearbyQuery, RatingSummary, ToiletResponse,
    UpdateToiletRequest,
};
use crate::state::AppState;

/// GET /api/v1/toilets
async fn list_toilets(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    let toilets = state.toilets.search(&query)?;
    sequence::respond(&headers, toilets).await
}

/// POST /api/v1/toilets
async fn create_toilet(
    State(state): State<AppState>,
    Json(request): Json<CreateToiletRequest>,
) -> Result<(StatusCode, Json<ToiletResponse>)> {
    let toilet = state.toilets.create(request)?;
    Ok((StatusCode::CREATED, Json(toilet)))
}

/// GET /api/v1/toilets/{id}
async fn get_toilet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ToiletResponse>> {
    Ok(Json(state.toilets.get(id)?))
}

/// PUT /api/v1/toilets/{id}
async fn update_toilet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateToiletRequest>,
) -> Result<Json<ToiletResponse>> {
    Ok(Json(state.toilets.update(id, request)?))
}

/// DELETE /api/v1/toilets/{id}
///
/// Removes the toilet's comments, ratings and images as well.
async fn delete_toilet(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>> {
    state.toilets.delete(id).await?;
    Ok(Json(DeleteResponse::new("Toilet", id)))
}

/// GET /api/v1/toilets/{id}/comments
async fn toilet_comments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response> {
    let comments = state.comments.get_comments(id)?;
    sequence::respond(&headers, comments).await
}

/// GET /api/v1/toilets/{id}/rating
async fn toilet_rating(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RatingSummary>> {
    Ok(Json(state.ratings.summary(id)?))
}

/// Create toilet routes
pub fn toilet_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_toilets).post(create_toilet))
        .route(
            "/{id}",
            get(get_toilet).put(update_toilet).delete(delete_toilet),
        )
        .route("/{id}/comments", get(toilet_comments))
        .route("/{id}/rating", get(toilet_rating))
}
