//! Toilet document and its API DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{image_url, GeoPoint, RatingSummary};
use crate::error::{AppError, Result};

const MAX_TITLE_LENGTH: usize = 200;
const MAX_DESCRIPTION_LENGTH: usize = 5000;

/// Toilet document as stored in the `toilets` column family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toilet {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: GeoPoint,
    /// Image shown in listings
    pub preview: Option<Uuid>,
    /// Running sum of all rating values
    pub rating_total: u64,
    /// Accessible for disabled people
    pub disabled: bool,
    /// Approved by a moderator
    pub approved: bool,
    pub comment_ids: Vec<Uuid>,
    pub image_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Toilet {
    pub fn new(request: CreateToiletRequest) -> Result<Self> {
        validate_text(&request.title, &request.description)?;
        request.location.validate()?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            title: request.title.trim().to_string(),
            description: request.description,
            location: request.location,
            preview: None,
            rating_total: 0,
            disabled: request.disabled,
            approved: false,
            comment_ids: Vec::new(),
            image_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update; untouched fields keep their value
    pub fn apply(&mut self, update: UpdateToiletRequest) -> Result<()> {
        let title = update.title.unwrap_or_else(|| self.title.clone());
        let description = update
            .description
            .unwrap_or_else(|| self.description.clone());
        validate_text(&title, &description)?;

        if let Some(location) = update.location {
            location.validate()?;
            self.location = location;
        }

        self.title = title.trim().to_string();
        self.description = description;
        if let Some(disabled) = update.disabled {
            self.disabled = disabled;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Remove a comment reference, returns whether it was present
    pub fn unlink_comment(&mut self, comment_id: Uuid) -> bool {
        let before = self.comment_ids.len();
        self.comment_ids.retain(|id| *id != comment_id);
        before != self.comment_ids.len()
    }

    /// Remove an image reference (gallery or preview)
    pub fn unlink_image(&mut self, image_id: Uuid) -> bool {
        let before = self.image_ids.len();
        self.image_ids.retain(|id| *id != image_id);
        let was_preview = self.preview == Some(image_id);
        if was_preview {
            self.preview = None;
        }
        was_preview || before != self.image_ids.len()
    }

    /// Every image owned by this toilet, preview first
    pub fn all_image_ids(&self) -> Vec<Uuid> {
        self.preview
            .into_iter()
            .chain(self.image_ids.iter().copied())
            .collect()
    }
}

fn validate_text(title: &str, description: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(AppError::validation("title must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::validation(format!(
            "title must be at most {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(AppError::validation(format!(
            "description must be at most {} characters",
            MAX_DESCRIPTION_LENGTH
        )));
    }
    Ok(())
}

/// Request body for `POST /api/v1/toilets`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateToiletRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub location: GeoPoint,
    #[serde(default)]
    pub disabled: bool,
}

/// Request body for `PUT /api/v1/toilets/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateToiletRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<GeoPoint>,
    pub disabled: Option<bool>,
}

/// Query string of `GET /api/v1/toilets`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyQuery {
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub radius_in_km: Option<f64>,
    pub radius_in_miles: Option<f64>,
    pub max_toilets_to_load: Option<usize>,
}

/// Presentation DTO combining stored fields with computed values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToiletResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: GeoPoint,
    pub rating: f64,
    pub rating_count: u64,
    pub preview_url: Option<String>,
    pub image_urls: Vec<String>,
    pub comment_count: usize,
    pub disabled: bool,
    pub approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ToiletResponse {
    pub fn assemble(
        toilet: &Toilet,
        rating: RatingSummary,
        base_url: &str,
        distance_meters: Option<f64>,
    ) -> Self {
        Self {
            id: toilet.id,
            title: toilet.title.clone(),
            description: toilet.description.clone(),
            location: toilet.location,
            rating: rating.average,
            rating_count: rating.count,
            preview_url: toilet.preview.map(|id| image_url(base_url, id)),
            image_urls: toilet
                .image_ids
                .iter()
                .map(|id| image_url(base_url, *id))
                .collect(),
            comment_count: toilet.comment_ids.len(),
            disabled: toilet.disabled,
            approved: toilet.approved,
            distance_meters,
            created_at: toilet.created_at,
            updated_at: toilet.updated_at,
        }
    }
}

/// Request body for `PUT /admin/toilets/{id}/approval`
#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalRequest {
    pub approved: bool,
}
