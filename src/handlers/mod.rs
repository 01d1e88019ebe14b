//! HTTP request handlers for the toilet review server.
//!
//! This module contains all endpoint handlers organized by resource:
//! - `toilets`: Toilet CRUD and nearby search
//! - `comments`: Comments and their linkage to toilets
//! - `ratings`: Ratings (1-5)
//! - `images`: Image upload and serving
//! - `users`: User registration and lookup
//! - `admin`: Moderation endpoints (local only)
//! - `health`: Health check endpoints

pub mod admin;
pub mod comments;
pub mod health;
pub mod images;
pub mod ratings;
pub mod sequence;
pub mod toilets;
pub mod users;

pub use admin::admin_routes;
pub use comments::comment_routes;
pub use health::health_routes;
pub use images::image_routes;
pub use ratings::rating_routes;
pub use toilets::toilet_routes;
pub use users::user_routes;
