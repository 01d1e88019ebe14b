//! Common test utilities and helpers.

#![allow(dead_code)]

use reqwest::multipart;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener as TokioTcpListener;
use toilet_review_server::{
    config::{
        CommentConfig, Config, ImageConfig, LoggingConfig, ServerConfig, StorageConfig,
        ToiletConfig,
    },
    create_admin_router, create_public_router, AppState,
};

/// Test server instance
pub struct TestServer {
    pub public_url: String,
    pub admin_url: String,
    pub data_dir: TempDir,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Start a test server with random ports
    pub async fn start() -> Self {
        let public_port = get_available_port();
        let admin_port = get_available_port();
        let data_dir = TempDir::new().expect("Failed to create temp dir");

        let public_url = format!("http://127.0.0.1:{}", public_port);
        let admin_url = format!("http://127.0.0.1:{}", admin_port);

        let config = create_test_config(&data_dir, public_port, admin_port, &public_url);

        let state = AppState::new(config)
            .await
            .expect("Failed to create app state");

        let public_app = create_public_router(state.clone());
        let admin_app = create_admin_router(state);

        let public_listener = TokioTcpListener::bind(("127.0.0.1", public_port))
            .await
            .expect("Failed to bind public listener");
        let admin_listener = TokioTcpListener::bind(("127.0.0.1", admin_port))
            .await
            .expect("Failed to bind admin listener");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        // Start servers in background
        tokio::spawn(async move {
            tokio::select! {
                _ = axum::serve(public_listener, public_app) => {}
                _ = axum::serve(admin_listener, admin_app) => {}
                _ = shutdown_rx => {}
            }
        });

        // Give servers time to start
        tokio::time::sleep(Duration::from_millis(50)).await;

        Self {
            public_url,
            admin_url,
            data_dir,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get HTTP client
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap()
    }

    /// Get public URL
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.public_url, path)
    }

    /// Get admin URL
    pub fn admin(&self, path: &str) -> String {
        format!("{}{}", self.admin_url, path)
    }

    /// Create a toilet and return its JSON representation
    pub async fn create_toilet(&self, title: &str, lon: f64, lat: f64) -> Value {
        let response = self
            .client()
            .post(self.url("/api/v1/toilets"))
            .json(&json!({
                "title": title,
                "description": "integration test toilet",
                "location": { "lon": lon, "lat": lat },
            }))
            .send()
            .await
            .expect("Failed to create toilet");
        assert_eq!(response.status(), 201);
        response.json().await.expect("Failed to parse toilet")
    }

    /// Register a user and return its id
    pub async fn create_user(&self, name: &str, email: &str) -> String {
        let response = self
            .client()
            .post(self.url("/api/v1/users"))
            .json(&json!({ "name": name, "email": email }))
            .send()
            .await
            .expect("Failed to create user");
        assert_eq!(response.status(), 201);
        let json: Value = response.json().await.expect("Failed to parse user");
        json["id"].as_str().unwrap().to_string()
    }

    /// Upload an image, returning the raw response
    pub async fn upload_image(
        &self,
        data: Vec<u8>,
        filename: &str,
        toilet_id: Option<&str>,
        preview: bool,
    ) -> reqwest::Response {
        let mut form = multipart::Form::new().part(
            "file",
            multipart::Part::bytes(data).file_name(filename.to_string()),
        );
        if let Some(toilet_id) = toilet_id {
            form = form.text("toiletId", toilet_id.to_string());
        }
        if preview {
            form = form.text("preview", "true");
        }

        self.client()
            .post(self.url("/api/v1/images"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to upload image")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Create test configuration
fn create_test_config(
    data_dir: &TempDir,
    public_port: u16,
    admin_port: u16,
    base_url: &str,
) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: public_port,
            admin_host: "127.0.0.1".to_string(),
            admin_port,
            base_url: base_url.to_string(),
        },
        storage: StorageConfig {
            data_dir: data_dir.path().to_path_buf(),
            images_dir: "images".to_string(),
            directory_levels: 2,
        },
        images: ImageConfig {
            max_upload_size: 2 * 1024 * 1024,
            allowed_types: vec!["image/jpeg".to_string(), "image/png".to_string()],
            cache_max_age: 3600,
        },
        toilets: ToiletConfig::default(),
        comments: CommentConfig::default(),
        logging: LoggingConfig {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        },
    }
}

/// Find an available TCP port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to random port")
        .local_addr()
        .expect("Failed to get local address")
        .port()
}

/// Create a test PNG image
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    use image::codecs::png::PngEncoder;
    use image::{ImageBuffer, ImageEncoder, Rgb};

    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([
            ((x * 255) / width) as u8,
            ((y * 255) / height) as u8,
            128,
        ])
    });

    let mut buffer = Vec::new();
    let encoder = PngEncoder::new(&mut buffer);
    encoder
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .expect("Failed to encode PNG");

    buffer
}

/// Create a test JPEG image
pub fn create_test_jpeg(width: u32, height: u32, quality: u8) -> Vec<u8> {
    use image::codecs::jpeg::JpegEncoder;
    use image::{ImageBuffer, ImageEncoder, Rgb};

    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([
            ((x * 255) / width) as u8,
            ((y * 255) / height) as u8,
            200,
        ])
    });

    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .expect("Failed to encode JPEG");

    buffer
}
