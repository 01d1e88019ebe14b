//! User endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{CreateUserRequest, UserLookupQuery, UserResponse};
use crate::state::AppState;

/// POST /api/v1/users
async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let user = state.users.create(request)?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/v1/users/{id}
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>> {
    Ok(Json(state.users.get(id)?))
}

/// GET /api/v1/users?email=
async fn find_user(
    State(state): State<AppState>,
    Query(query): Query<UserLookupQuery>,
) -> Result<Json<UserResponse>> {
    Ok(Json(state.users.find_by_email(&query.email)?))
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(find_user).post(create_user))
        .route("/{id}", get(get_user))
}
