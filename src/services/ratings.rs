//! Rating service.
//!
//! Averages are never stored; they are aggregated from the rating index
//! whenever a toilet is read.

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    CreateRatingRequest, Rating, RatingResponse, RatingSummary, RatingValue, UpdateRatingRequest,
};
use crate::services::DatabaseService;

#[derive(Debug, Clone)]
pub struct RatingService {
    db: Arc<DatabaseService>,
}

impl RatingService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    pub fn create(&self, request: CreateRatingRequest) -> Result<RatingResponse> {
        let value = RatingValue::new(request.value)?;
        if self.db.get_user(request.user_id)?.is_none() {
            return Err(AppError::UserNotFound(request.user_id));
        }

        let rating = Rating::new(request.toilet_id, request.user_id, value);
        self.db.insert_rating(&rating)?;

        info!(id = %rating.id, toilet_id = %rating.toilet_id, value = value.get(), "Created rating");
        Ok(RatingResponse::from(&rating))
    }

    pub fn get(&self, id: Uuid) -> Result<RatingResponse> {
        let rating = self.db.get_rating(id)?.ok_or(AppError::RatingNotFound(id))?;
        Ok(RatingResponse::from(&rating))
    }

    pub fn update(&self, id: Uuid, request: UpdateRatingRequest) -> Result<RatingResponse> {
        let value = RatingValue::new(request.value)?;
        let rating = self.db.update_rating_value(id, value)?;

        info!(id = %id, value = value.get(), "Updated rating");
        Ok(RatingResponse::from(&rating))
    }

    pub fn delete(&self, id: Uuid) -> Result<()> {
        if !self.db.delete_rating(id)? {
            return Err(AppError::RatingNotFound(id));
        }
        info!(id = %id, "Deleted rating");
        Ok(())
    }

    /// Average rating of an existing toilet
    pub fn summary(&self, toilet_id: Uuid) -> Result<RatingSummary> {
        if self.db.get_toilet(toilet_id)?.is_none() {
            return Err(AppError::ToiletNotFound(toilet_id));
        }
        self.db.rating_summary(toilet_id)
    }
}
