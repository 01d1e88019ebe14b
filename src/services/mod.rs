//! Service layer for the toilet review server.
//!
//! This module contains:
//! - The RocksDB document store and the blob store
//! - Upload validation for images
//! - One domain service per entity, called by the HTTP handlers

pub mod comments;
pub mod database;
pub mod image_inspector;
pub mod images;
pub mod ratings;
pub mod storage;
pub mod toilets;
pub mod users;

pub use comments::CommentService;
pub use database::{DatabaseService, DatabaseStats};
pub use image_inspector::{accepts, ImageInspector, InspectedImage};
pub use images::{ImageService, ImageUpload};
pub use ratings::RatingService;
pub use storage::{StorageService, StorageStats};
pub use toilets::ToiletService;
pub use users::UserService;
