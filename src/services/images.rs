//! Image service: upload validation, blob persistence and linkage to
//! toilets.

use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use tokio::fs::File;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::ImageMeta;
use crate::services::{DatabaseService, ImageInspector, StorageService};

/// A parsed multipart upload
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub data: Bytes,
    pub toilet_id: Option<Uuid>,
    pub preview: bool,
}

#[derive(Debug, Clone)]
pub struct ImageService {
    db: Arc<DatabaseService>,
    storage: Arc<StorageService>,
    inspector: ImageInspector,
}

impl ImageService {
    pub fn new(
        db: Arc<DatabaseService>,
        storage: Arc<StorageService>,
        inspector: ImageInspector,
    ) -> Self {
        Self {
            db,
            storage,
            inspector,
        }
    }

    pub fn inspector(&self) -> &ImageInspector {
        &self.inspector
    }

    /// Validate and persist an upload, returning its metadata.
    ///
    /// A preview upload replaces the toilet's current preview; the old
    /// blob is removed best-effort.
    pub async fn store(&self, upload: ImageUpload) -> Result<ImageMeta> {
        if upload.preview && upload.toilet_id.is_none() {
            return Err(AppError::validation("A preview image needs a toiletId"));
        }
        let inspected = self.inspector.inspect(&upload.filename, &upload.data)?;

        // Checked before writing so a bad toiletId leaves no blob behind
        if let Some(toilet_id) = upload.toilet_id {
            if self.db.get_toilet(toilet_id)?.is_none() {
                return Err(AppError::ToiletNotFound(toilet_id));
            }
        }

        let meta = ImageMeta {
            id: Uuid::new_v4(),
            toilet_id: upload.toilet_id,
            preview: upload.preview,
            mime_type: inspected.mime_type,
            original_filename: upload.filename,
            size: upload.data.len() as u64,
            width: inspected.width,
            height: inspected.height,
            created_at: Utc::now(),
        };

        self.storage
            .save(meta.id, meta.extension(), &upload.data)
            .await?;

        let replaced = match self.db.insert_image(&meta) {
            Ok(replaced) => replaced,
            Err(e) => {
                // toilet may have vanished between the check and the insert
                if let Err(cleanup) = self.storage.delete(meta.id, meta.extension()).await {
                    warn!(id = %meta.id, error = %cleanup, "Failed to remove blob of rejected upload");
                }
                return Err(e);
            }
        };

        if let Some(old) = replaced {
            self.remove_blob(&old).await;
        }

        info!(
            id = %meta.id,
            toilet_id = ?meta.toilet_id,
            preview = meta.preview,
            mime = %meta.mime_type,
            size = meta.size,
            "Stored image"
        );
        Ok(meta)
    }

    /// Metadata only
    pub fn info(&self, id: Uuid) -> Result<ImageMeta> {
        self.db.get_image(id)?.ok_or(AppError::ImageNotFound(id))
    }

    /// Metadata first, then the content as an open file
    pub async fn get(&self, id: Uuid) -> Result<(ImageMeta, File)> {
        let meta = self.info(id)?;
        let file = self.open(&meta).await?;
        Ok((meta, file))
    }

    /// Content of an image whose metadata is already loaded
    pub async fn open(&self, meta: &ImageMeta) -> Result<File> {
        self.storage.open(meta.id, meta.extension()).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let meta = self.db.delete_image(id)?.ok_or(AppError::ImageNotFound(id))?;
        self.remove_blob(&meta).await;

        info!(id = %id, "Deleted image");
        Ok(())
    }

    async fn remove_blob(&self, meta: &ImageMeta) {
        if let Err(e) = self.storage.delete(meta.id, meta.extension()).await {
            warn!(id = %meta.id, error = %e, "Failed to delete image blob");
        }
    }
}
