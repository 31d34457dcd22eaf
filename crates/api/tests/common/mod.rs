//! Shared helpers for the API integration tests.
//!
//! Every test gets its own [`TestApp`]: the production router and middleware
//! stack over an in-memory store and a temp-dir object store.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use examhall_api::auth::jwt::{generate_access_token, JwtConfig};
use examhall_api::config::ServerConfig;
use examhall_api::router::build_app_router;
use examhall_api::state::AppState;
use examhall_api::storage::LocalObjectStore;
use examhall_core::types::DbId;
use examhall_db::MemoryStore;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

pub const PUBLIC_BASE_URL: &str = "http://localhost:3000";
const BOUNDARY: &str = "examhall-test-boundary";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(storage_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        max_upload_bytes: 1024 * 1024,
        storage_dir,
        public_base_url: PUBLIC_BASE_URL.to_string(),
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            issuer: None,
            access_token_expiry_mins: 60,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub config: ServerConfig,
    _storage: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let storage = tempfile::tempdir().unwrap();
        let config = test_config(storage.path().to_path_buf());
        let store = Arc::new(MemoryStore::new());

        let state = AppState {
            store: store.clone(),
            objects: Arc::new(LocalObjectStore::new(
                storage.path().to_path_buf(),
                PUBLIC_BASE_URL,
            )),
            config: Arc::new(config.clone()),
        };

        Self {
            router: build_app_router(state, &config),
            store,
            config,
            _storage: storage,
        }
    }

    /// A valid bearer token for `user_id`.
    pub fn token(&self, user_id: DbId) -> String {
        generate_access_token(user_id, "authenticated", &self.config.jwt).unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        self.send(request(Method::GET, uri, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Response {
        self.send(request(Method::DELETE, uri, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(
        &self,
        uri: &str,
        body: serde_json::Value,
        token: Option<&str>,
    ) -> Response {
        self.send_json(Method::POST, uri, body, token).await
    }

    pub async fn put_json(&self, uri: &str, body: serde_json::Value, token: Option<&str>) -> Response {
        self.send_json(Method::PUT, uri, body, token).await
    }

    async fn send_json(
        &self,
        method: Method,
        uri: &str,
        body: serde_json::Value,
        token: Option<&str>,
    ) -> Response {
        let request = request(method, uri, token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        self.send(request).await
    }

    pub async fn post_multipart(&self, uri: &str, parts: &[Part<'_>], token: Option<&str>) -> Response {
        let request = request(Method::POST, uri, token)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        self.send(request).await
    }

    /// Register a device for `owner` through the API and return its JSON.
    pub async fn create_device(&self, owner: DbId, name: &str, ip: &str) -> serde_json::Value {
        let token = self.token(owner);
        let response = self
            .post_json(
                "/api/v1/devices",
                serde_json::json!({"name": name, "ip_address": ip}),
                Some(&token),
            )
            .await;
        assert_eq!(response.status(), 201);
        body_json(response).await["data"].clone()
    }
}

fn request(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

/// One part of a multipart form.
pub enum Part<'a> {
    File { name: &'a str, file_name: &'a str, bytes: &'a [u8] },
    Text { name: &'a str, value: &'a str },
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File { name, file_name, bytes } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// An xlsx roster with the given `[name, status]` rows under the standard header.
pub fn roster(rows: &[[&str; 2]]) -> Vec<u8> {
    examhall_api::spreadsheet::write_workbook(
        "Sheet1",
        &["Student_Name", "Status"],
        rows.iter().copied(),
    )
    .unwrap()
}
