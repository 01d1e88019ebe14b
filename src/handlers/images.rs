//! Image upload and serving.
//!
//! ## Endpoints
//!
//! - `POST /api/v1/images` - Multipart upload with a `file` field, an
//!   optional `toiletId` and an optional `preview` flag
//! - `GET /api/v1/images/{id}` - Image content
//! - `GET /api/v1/images/{id}/info` - Image metadata
//! - `DELETE /api/v1/images/{id}`
//!
//! ## Caching
//!
//! Content responses carry `Cache-Control: public, max-age={from config},
//! immutable` and an `ETag`; `If-None-Match` is answered with 304.
//!
//! # Example
//!
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/images \
//!   -F "file=@toilet.jpg" -F "toiletId=..." -F "preview=true"
//! ```

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{DeleteResponse, ImageInfoResponse, ImageUploadResponse};
use crate::services::{accepts, ImageUpload};
use crate::state::AppState;

/// POST /api/v1/images
async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ImageUploadResponse>)> {
    let max_size = state.images.inspector().max_size();
    let mut file: Option<(String, Bytes)> = None;
    let mut toilet_id = None;
    let mut preview = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Invalid multipart data: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "upload".to_string());

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("Failed to read file: {}", e)))?;

                if data.len() as u64 > max_size {
                    return Err(AppError::payload_too_large(format!(
                        "File size {} exceeds maximum allowed size {}",
                        data.len(),
                        max_size
                    )));
                }

                file = Some((filename, data));
            }
            "toiletId" => {
                let text = field_text(field).await?;
                if !text.is_empty() {
                    toilet_id = Some(Uuid::parse_str(&text)?);
                }
            }
            "preview" => {
                preview = parse_flag(&field_text(field).await?)?;
            }
            other => debug!(field = %other, "Ignoring multipart field"),
        }
    }

    let (filename, data) =
        file.ok_or_else(|| AppError::validation("No file field found in multipart request"))?;

    info!(filename = %filename, size = data.len(), "Received image upload");

    let meta = state
        .images
        .store(ImageUpload {
            filename,
            data,
            toilet_id,
            preview,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ImageUploadResponse::from_meta(&meta, state.base_url())),
    ))
}

async fn field_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    let text = field
        .text()
        .await
        .map_err(|e| AppError::validation(format!("Invalid multipart field: {}", e)))?;
    Ok(text.trim().to_string())
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" | "" => Ok(false),
        other => Err(AppError::validation(format!(
            "preview must be a boolean, got '{}'",
            other
        ))),
    }
}

/// GET /api/v1/images/{id}
///
/// Streams the stored content. The representation is fixed at upload
/// time, so an `Accept` header excluding it yields 406.
async fn serve_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response> {
    let meta = state.images.info(id)?;

    let accept = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok());
    if !accepts(accept, &meta.mime_type) {
        return Err(AppError::not_acceptable(format!(
            "Image {} is only available as {}",
            id, meta.mime_type
        )));
    }

    // Check ETag for caching
    let etag = meta.etag();
    let not_modified = headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| etag_matches(v, &etag));
    if not_modified {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let file = state.images.open(&meta).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    let cache_control = format!("public, max-age={}, immutable", state.cache_max_age());

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &meta.mime_type)
        .header(header::CONTENT_LENGTH, meta.size)
        .header(header::CACHE_CONTROL, cache_control)
        .header(header::ETAG, etag)
        .header(header::VARY, "Accept")
        .header("X-Content-Type-Options", "nosniff")
        .body(body)
        .map_err(|e| AppError::internal(format!("Failed to build response: {}", e)))?;

    debug!(id = %id, mime = %meta.mime_type, "Served image");

    Ok(response)
}

/// Weak comparison of an `If-None-Match` value against our entity tag
fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match.split(',').map(str::trim).any(|tag| {
        tag == "*" || tag.strip_prefix("W/").unwrap_or(tag) == etag
    })
}

/// GET /api/v1/images/{id}/info
async fn image_info(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ImageInfoResponse>> {
    let meta = state.images.info(id)?;
    Ok(Json(ImageInfoResponse::from_meta(&meta, state.base_url())))
}

/// DELETE /api/v1/images/{id}
async fn delete_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>> {
    state.images.delete(id).await?;
    Ok(Json(DeleteResponse::new("Image", id)))
}

/// Create image routes
pub fn image_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(upload_image))
        .route("/{id}", get(serve_image).delete(delete_image))
        .route("/{id}/info", get(image_info))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true").unwrap());
        assert!(parse_flag("1").unwrap());
        assert!(!parse_flag("").unwrap());
        assert!(!parse_flag("False").unwrap());
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn test_etag_matches() {
        let etag = "\"abc-10\"";
        assert!(etag_matches("\"abc-10\"", etag));
        assert!(etag_matches("*", etag));
        assert!(etag_matches("W/\"abc-10\"", etag));
        assert!(etag_matches("\"other\", W/\"abc-10\"", etag));
        assert!(!etag_matches("\"other\"", etag));
        assert!(!etag_matches("\"abc-11\", W/\"abc\"", etag));
    }
}
