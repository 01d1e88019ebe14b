//! Blob store for image content.
//!
//! Files are organized in a hierarchical structure using the first
//! characters of the UUID to avoid having too many files in a single
//! directory.
//!
//! ```text
//! data/
//! └── images/
//!     └── ab/cd/           # First 2 chars / next 2 chars of UUID
//!         └── abcd1234-...-5678.jpg
//! ```

use crate::config::StorageConfig;
use crate::error::{AppError, Result};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tracing::{debug, info};
use uuid::Uuid;

/// Service for managing blob files
#[derive(Debug, Clone)]
pub struct StorageService {
    /// Root of the image blobs
    images_dir: PathBuf,
    /// Number of directory nesting levels (0-4)
    directory_levels: u8,
}

impl StorageService {
    /// Create a new storage service and initialize directories
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        let service = Self {
            images_dir: config.images_path(),
            directory_levels: config.directory_levels,
        };

        if !service.images_dir.exists() {
            fs::create_dir_all(&service.images_dir).await?;
            debug!(path = %service.images_dir.display(), "Created storage directory");
        }

        info!(
            images = %service.images_dir.display(),
            directory_levels = service.directory_levels,
            "Storage service initialized"
        );

        Ok(service)
    }

    /// Generate subdirectory path based on UUID and configured nesting levels
    ///
    /// For UUID "550e8400-e29b-41d4-a716-446655440000":
    /// - level 0: ""
    /// - level 1: "55"
    /// - level 2: "55/0e"
    fn subdir_path(&self, id: Uuid) -> PathBuf {
        let hex = id.as_simple().to_string();
        let mut path = PathBuf::new();

        for level in 0..self.directory_levels.min(4) {
            let start = (level as usize) * 2;
            path.push(&hex[start..start + 2]);
        }

        path
    }

    /// Full path of a blob
    pub fn blob_path(&self, id: Uuid, extension: &str) -> PathBuf {
        self.images_dir
            .join(self.subdir_path(id))
            .join(format!("{}.{}", id, extension))
    }

    async fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await?;
                debug!(path = %parent.display(), "Created subdirectory");
            }
        }
        Ok(())
    }

    /// Write a blob, returns its path
    pub async fn save(&self, id: Uuid, extension: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.blob_path(id, extension);
        Self::ensure_parent(&path).await?;
        fs::write(&path, data).await?;

        debug!(id = %id, path = %path.display(), size = data.len(), "Saved blob");
        Ok(path)
    }

    /// Open a blob for streaming
    pub async fn open(&self, id: Uuid, extension: &str) -> Result<File> {
        let path = self.blob_path(id, extension);
        match File::open(&path).await {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::ImageNotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a blob; deleting a missing blob is not an error
    pub async fn delete(&self, id: Uuid, extension: &str) -> Result<()> {
        let path = self.blob_path(id, extension);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(id = %id, path = %path.display(), "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn exists(&self, id: Uuid, extension: &str) -> bool {
        self.blob_path(id, extension).exists()
    }

    /// Get storage statistics
    pub async fn get_stats(&self) -> Result<StorageStats> {
        let (total_size, file_count) = Self::walk(&self.images_dir).await?;
        Ok(StorageStats {
            total_size,
            file_count,
        })
    }

    /// Total size and file count below `path`
    async fn walk(path: &Path) -> Result<(u64, usize)> {
        if !path.exists() {
            return Ok((0, 0));
        }

        let mut size = 0;
        let mut count = 0;
        let mut entries = fs::read_dir(path).await?;

        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if metadata.is_file() {
                size += metadata.len();
                count += 1;
            } else if metadata.is_dir() {
                let (s, c) = Box::pin(Self::walk(&entry.path())).await?;
                size += s;
                count += c;
            }
        }

        Ok((size, count))
    }
}

/// Storage statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct StorageStats {
    /// Total blob size in bytes
    pub total_size: u64,
    /// Number of stored blobs
    pub file_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    async fn create_test_service(levels: u8) -> (StorageService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            images_dir: "images".to_string(),
            directory_levels: levels,
        };

        let service = StorageService::new(&config).await.unwrap();
        (service, temp_dir)
    }

    #[tokio::test]
    async fn test_save_read_delete() {
        let (service, _temp) = create_test_service(2).await;
        let id = Uuid::new_v4();

        service.save(id, "png", b"blob").await.unwrap();
        assert!(service.exists(id, "png"));
        let mut content = Vec::new();
        service
            .open(id, "png")
            .await
            .unwrap()
            .read_to_end(&mut content)
            .await
            .unwrap();
        assert_eq!(content, b"blob");

        service.delete(id, "png").await.unwrap();
        assert!(!service.exists(id, "png"));
        assert!(matches!(
            service.open(id, "png").await,
            Err(AppError::ImageNotFound(_))
        ));

        // idempotent
        service.delete(id, "png").await.unwrap();
    }

    #[tokio::test]
    async fn test_nested_layout() {
        let (service, _temp) = create_test_service(2).await;
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();

        let path = service.blob_path(id, "jpg");
        assert!(path.ends_with("55/0e/550e8400-e29b-41d4-a716-446655440000.jpg"));

        let (flat, _temp2) = create_test_service(0).await;
        assert!(flat
            .blob_path(id, "jpg")
            .ends_with("images/550e8400-e29b-41d4-a716-446655440000.jpg"));
    }

    #[tokio::test]
    async fn test_stats() {
        let (service, _temp) = create_test_service(2).await;
        service.save(Uuid::new_v4(), "png", b"abc").await.unwrap();
        service.save(Uuid::new_v4(), "jpg", b"defgh").await.unwrap();

        let stats = service.get_stats().await.unwrap();
        assert_eq!(stats.file_count, 2);
        assert_eq!(stats.total_size, 8);
    }
}
