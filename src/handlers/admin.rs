//! Admin API handlers (local only).
//!
//! These endpoints are only accessible from localhost and provide
//! moderation of submitted toilets.
//!
//! ## Endpoints
//!
//! - `GET /admin/toilets/pending` - Toilets awaiting approval
//! - `PUT /admin/toilets/{id}/approval` - Approve or reject a toilet
//! - `GET /admin/stats` - Entity counts and blob usage
//!
//! ## Security
//!
//! The admin API is bound to 127.0.0.1 only and should never be
//! exposed to the public internet.

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ApprovalRequest, ToiletResponse};
use crate::services::{DatabaseStats, StorageStats};
use crate::state::AppState;

/// GET /admin/toilets/pending
async fn pending_toilets(State(state): State<AppState>) -> Result<Json<Vec<ToiletResponse>>> {
    Ok(Json(state.toilets.pending()?))
}

/// PUT /admin/toilets/{id}/approval
async fn set_approval(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ApprovalRequest>,
) -> Result<Json<ToiletResponse>> {
    let toilet = state.toilets.set_approval(id, request.approved)?;
    info!(id = %id, approved = request.approved, "Moderated toilet");
    Ok(Json(toilet))
}

/// GET /admin/stats
async fn get_stats(State(state): State<AppState>) -> Result<Json<AdminStatsResponse>> {
    Ok(Json(AdminStatsResponse {
        entities: state.db.stats()?,
        storage: state.storage.get_stats().await?,
    }))
}

/// Admin stats response
#[derive(Debug, Serialize)]
pub struct AdminStatsResponse {
    pub entities: DatabaseStats,
    pub storage: StorageStats,
}

/// Create admin routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/toilets/pending", get(pending_toilets))
        .route("/toilets/{id}/approval", put(set_approval))
        .route("/stats", get(get_stats))
}
