//! # Toilet Review Server
//!
//! A location-based toilet review backend written in Rust.
//!
//! ## Features
//!
//! - **Toilets**: CRUD plus nearby search by radius (km or miles)
//! - **Comments**: Linked to their toilet, percent-encoded text accepted
//! - **Ratings**: One 1-5 rating per user and toilet, averaged on read
//! - **Images**: JPEG/PNG uploads stored as blobs, previews per toilet
//! - **Admin API**: Approval of submitted toilets
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     HTTP Server                       │
//! │  ┌──────────┐ ┌──────────┐ ┌────────┐ ┌───────────┐  │
//! │  │ Toilets  │ │ Comments │ │ Images │ │ Admin API │  │
//! │  │ Ratings  │ │  Users   │ │        │ │           │  │
//! │  └──────────┘ └──────────┘ └────────┘ └───────────┘  │
//! ├──────────────────────────────────────────────────────┤
//! │                      Services                         │
//! │  ┌──────────┐ ┌──────────┐ ┌────────┐ ┌───────────┐  │
//! │  │ Toilet   │ │ Comment  │ │ Image  │ │ Rating    │  │
//! │  └──────────┘ └──────────┘ └────────┘ └───────────┘  │
//! ├──────────────────────────────────────────────────────┤
//! │          RocksDB documents  /  blob files             │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the server
//! cargo run --release
//!
//! # Create a toilet
//! curl -X POST http://localhost:3000/api/v1/toilets \
//!   -H "Content-Type: application/json" \
//!   -d '{"title": "Central Station", "location": {"lon": 13.37, "lat": 52.52}}'
//!
//! # Find toilets within 2 km
//! curl "http://localhost:3000/api/v1/toilets?lon=13.4&lat=52.5&radiusInKm=2"
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Room for multipart boundaries and form fields on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Run the toilet review server with the given configuration.
///
/// This function starts both the public and admin API servers.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = AppState::new(config.clone()).await?;

    let public_app = create_public_router(state.clone());
    let admin_app = create_admin_router(state);

    let public_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid public server address")?;

    let admin_addr: SocketAddr =
        format!("{}:{}", config.server.admin_host, config.server.admin_port)
            .parse()
            .context("Invalid admin server address")?;

    info!(address = %public_addr, "Public API server starting");
    info!(address = %admin_addr, "Admin API server starting");

    // Run both servers concurrently
    let public_listener = TcpListener::bind(public_addr).await?;
    let admin_listener = TcpListener::bind(admin_addr).await?;

    tokio::select! {
        result = axum::serve(public_listener, public_app) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Public server error");
            }
        }
        result = axum::serve(admin_listener, admin_app) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Admin server error");
            }
        }
    }

    Ok(())
}

/// Create the public API router
pub fn create_public_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Body size limit (from config)
    let body_limit = RequestBodyLimitLayer::new(
        state.config.images.max_upload_size as usize + MULTIPART_OVERHEAD,
    );

    Router::new()
        .nest("/api/v1/toilets", handlers::toilet_routes())
        .nest("/api/v1/comments", handlers::comment_routes())
        .nest("/api/v1/ratings", handlers::rating_routes())
        .nest("/api/v1/users", handlers::user_routes())
        .nest("/api/v1/images", handlers::image_routes())
        .nest("/health", handlers::health_routes())
        .layer(DefaultBodyLimit::disable())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(body_limit)
                .layer(cors),
        )
        .with_state(state)
}

/// Create the admin API router (localhost only)
pub fn create_admin_router(state: AppState) -> Router {
    Router::new()
        .nest("/admin", handlers::admin_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
