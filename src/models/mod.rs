//! Data models for the toilet review server.
//!
//! This module contains the stored documents (toilets, comments, ratings,
//! users, image metadata) and the DTOs returned by the HTTP API.

mod comment;
mod geo;
mod image;
mod rating;
mod toilet;
mod user;

pub use comment::*;
pub use geo::*;
pub use image::*;
pub use rating::*;
pub use toilet::*;
pub use user::*;

use serde::Serialize;
use uuid::Uuid;

/// Public URL of an image's content
pub fn image_url(base_url: &str, id: Uuid) -> String {
    format!("{}/api/v1/images/{}", base_url, id)
}

/// Response body for delete endpoints
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub id: Uuid,
}

impl DeleteResponse {
    pub fn new(kind: &str, id: Uuid) -> Self {
        Self {
            success: true,
            message: format!("{} {} deleted successfully", kind, id),
            id,
        }
    }
}
