//! Image metadata document and DTOs.
//!
//! Image bytes live in the blob store; this module only describes the
//! metadata record kept in the `images` column family.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::image_url;

/// Image metadata document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMeta {
    pub id: Uuid,
    /// Owning toilet, if the upload named one
    pub toilet_id: Option<Uuid>,
    /// Whether this image is the owning toilet's preview
    pub preview: bool,
    pub mime_type: String,
    pub original_filename: String,
    pub size: u64,
    pub width: u32,
    pub height: u32,
    pub created_at: DateTime<Utc>,
}

impl ImageMeta {
    /// File extension used for the blob
    pub fn extension(&self) -> &'static str {
        mime_to_extension(&self.mime_type)
    }

    /// Strong validator for conditional requests
    pub fn etag(&self) -> String {
        format!("\"{}-{}\"", self.id.as_simple(), self.size)
    }
}

/// Get file extension for an accepted MIME type
pub fn mime_to_extension(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        _ => "bin",
    }
}

/// Response DTO for a successful upload
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadResponse {
    pub id: Uuid,
    pub url: String,
}

impl ImageUploadResponse {
    pub fn from_meta(meta: &ImageMeta, base_url: &str) -> Self {
        Self {
            id: meta.id,
            url: image_url(base_url, meta.id),
        }
    }
}

/// Response DTO for `GET /api/v1/images/{id}/info`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfoResponse {
    pub id: Uuid,
    pub toilet_id: Option<Uuid>,
    pub preview: bool,
    pub mime_type: String,
    pub original_filename: String,
    pub size: u64,
    pub width: u32,
    pub height: u32,
    pub created_at: DateTime<Utc>,
    pub url: String,
}

impl ImageInfoResponse {
    pub fn from_meta(meta: &ImageMeta, base_url: &str) -> Self {
        Self {
            id: meta.id,
            toilet_id: meta.toilet_id,
            preview: meta.preview,
            mime_type: meta.mime_type.clone(),
            original_filename: meta.original_filename.clone(),
            size: meta.size,
            width: meta.width,
            height: meta.height,
            created_at: meta.created_at,
            url: image_url(base_url, meta.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(mime_to_extension("image/jpeg"), "jpg");
        assert_eq!(mime_to_extension("image/png"), "png");
        assert_eq!(mime_to_extension("image/gif"), "bin");
    }

    #[test]
    fn test_upload_response_url() {
        let meta = ImageMeta {
            id: Uuid::nil(),
            toilet_id: None,
            preview: false,
            mime_type: "image/png".to_string(),
            original_filename: "a.png".to_string(),
            size: 10,
            width: 1,
            height: 1,
            created_at: Utc::now(),
        };

        let response = ImageUploadResponse::from_meta(&meta, "http://host");
        assert_eq!(
            response.url,
            "http://host/api/v1/images/00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(meta.extension(), "png");
    }
}
