//! Image validation.
//!
//! An upload is accepted when:
//! 1. its file extension maps to one of the configured MIME types,
//! 2. its magic bytes agree with that MIME type,
//! 3. the image header can be decoded (dimensions are recorded).

use crate::config::ImageConfig;
use crate::error::{AppError, Result};
use image::ImageReader;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Result of inspecting an upload
#[derive(Debug, Clone, PartialEq)]
pub struct InspectedImage {
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

/// Validates uploads against the configured image types
#[derive(Debug, Clone)]
pub struct ImageInspector {
    config: ImageConfig,
}

impl ImageInspector {
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn max_size(&self) -> u64 {
        self.config.max_upload_size
    }

    /// MIME type implied by the filename's extension, if it is accepted
    pub fn mime_for_filename(&self, filename: &str) -> Result<String> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                AppError::unsupported_media_type(format!(
                    "File '{}' has no extension",
                    filename
                ))
            })?;

        let mime = mime_guess::from_ext(ext)
            .first()
            .map(|m| m.essence_str().to_string())
            .ok_or_else(|| {
                AppError::unsupported_media_type(format!("Unknown file extension '.{}'", ext))
            })?;

        if !self.config.is_allowed_type(&mime) {
            return Err(AppError::unsupported_media_type(format!(
                "'.{}' ({}) is not an accepted image type, expected one of {:?}",
                ext, mime, self.config.allowed_types
            )));
        }

        Ok(mime)
    }

    /// Validate an upload and read its dimensions
    pub fn inspect(&self, filename: &str, data: &[u8]) -> Result<InspectedImage> {
        let mime_type = self.mime_for_filename(filename)?;

        if data.is_empty() {
            return Err(AppError::validation("Uploaded file is empty"));
        }
        if data.len() as u64 > self.max_size() {
            return Err(AppError::payload_too_large(format!(
                "File size {} exceeds maximum allowed size {}",
                data.len(),
                self.max_size()
            )));
        }

        // Use infer crate for reliable magic byte detection
        let detected = infer::get(data).map(|kind| kind.mime_type());
        if detected != Some(mime_type.as_str()) {
            return Err(AppError::unsupported_media_type(format!(
                "Content of '{}' is {} but the extension says {}",
                filename,
                detected.unwrap_or("unknown"),
                mime_type
            )));
        }

        let (width, height) = ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .into_dimensions()?;

        debug!(mime = %mime_type, width, height, size = data.len(), "Inspected image");

        Ok(InspectedImage {
            mime_type,
            width,
            height,
        })
    }
}

/// Whether an `Accept` header value admits `mime_type`.
///
/// A missing header accepts everything. The most specific matching range
/// decides, so `image/png;q=0, */*` still refuses PNG.
pub fn accepts(accept: Option<&str>, mime_type: &str) -> bool {
    let Some(accept) = accept else {
        return true;
    };
    let (major, _) = mime_type.split_once('/').unwrap_or((mime_type, ""));

    let mut best: Option<(u8, f32)> = None;
    for range in accept.split(',') {
        let mut parts = range.split(';').map(str::trim);
        let media_range = parts.next().unwrap_or("");
        let specificity = if media_range.eq_ignore_ascii_case(mime_type) {
            2
        } else if media_range
            .strip_suffix("/*")
            .is_some_and(|m| m.eq_ignore_ascii_case(major))
        {
            1
        } else if media_range == "*/*" {
            0
        } else {
            continue;
        };
        let quality = parts
            .find_map(|p| p.strip_prefix("q="))
            .and_then(|q| q.parse::<f32>().ok())
            .unwrap_or(1.0);

        if best.map_or(true, |(s, _)| specificity > s) {
            best = Some((specificity, quality));
        }
    }

    best.is_some_and(|(_, quality)| quality > 0.0)
}
