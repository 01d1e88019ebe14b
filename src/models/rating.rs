//! Rating document, validated rating value and aggregate summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// A rating value in `1..=5`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct RatingValue(u8);

impl RatingValue {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self> {
        if value < i64::from(Self::MIN) || value > i64::from(Self::MAX) {
            return Err(AppError::validation(format!(
                "rating value must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            )));
        }
        Ok(Self(value as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for RatingValue {
    type Error = AppError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RatingValue> for u8 {
    fn from(value: RatingValue) -> Self {
        value.0
    }
}

/// Rating document as stored in the `ratings` column family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: Uuid,
    pub toilet_id: Uuid,
    pub user_id: Uuid,
    pub value: RatingValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rating {
    pub fn new(toilet_id: Uuid, user_id: Uuid, value: RatingValue) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            toilet_id,
            user_id,
            value,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Average over all ratings of one toilet
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub average: f64,
    pub count: u64,
}

impl RatingSummary {
    pub fn from_totals(sum: u64, count: u64) -> Self {
        let average = if count == 0 {
            0.0
        } else {
            sum as f64 / count as f64
        };
        Self { average, count }
    }
}

/// Request body for `POST /api/v1/ratings`.
///
/// The value stays a raw integer here so that out-of-range input is
/// reported as a validation error instead of a body rejection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRatingRequest {
    pub toilet_id: Uuid,
    pub user_id: Uuid,
    pub value: i64,
}

/// Request body for `PUT /api/v1/ratings/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRatingRequest {
    pub value: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    pub id: Uuid,
    pub toilet_id: Uuid,
    pub user_id: Uuid,
    pub value: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Rating> for RatingResponse {
    fn from(rating: &Rating) -> Self {
        Self {
            id: rating.id,
            toilet_id: rating.toilet_id,
            user_id: rating.user_id,
            value: rating.value.get(),
            created_at: rating.created_at,
            updated_at: rating.updated_at,
        }
    }
}
