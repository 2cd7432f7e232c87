//! Common test utilities for driving the router in-process with a mock engine.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use omr_gateway_core::testing::{MockEngine, MockOutcome, MockSheet, TemplateFixture};
use omr_gateway_core::{CheckService, OmrEngine, SecureFileServer};

const BOUNDARY: &str = "omr-gateway-test-boundary";

/// Test fixture for in-process API tests.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_check() {
///     let fixture = TestFixture::new();
///     let form = MultipartForm::new().file("image", "sheet.png", b"png");
///     let response = fixture.post_check("", form).await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Scripted engine - inspect recorded runs
    pub engine: Arc<MockEngine>,
    /// Template tree and output directories
    pub templates: TemplateFixture,
    /// Keeps the fixture directories alive
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub outcome: MockOutcome,
    /// Upload ceiling override.
    pub max_bytes: Option<u64>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            outcome: MockOutcome::Recognized(MockSheet::sample()),
            max_bytes: None,
        }
    }
}

impl TestFixture {
    /// Create a fixture with a `default` template that carries an evaluation.
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    pub fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let templates = TemplateFixture::new(temp_dir.path())
            .with_template("default", true)
            .with_template("plain", false);

        let mut config = templates.config();
        if let Some(max_bytes) = test_config.max_bytes {
            config.upload.max_bytes = max_bytes;
        }

        let engine = Arc::new(MockEngine::new(test_config.outcome));
        let check_service =
            CheckService::new(&config, Arc::clone(&engine) as Arc<dyn OmrEngine>);
        let file_server = SecureFileServer::new(config.paths.checked_omr_dir());
        let state = Arc::new(omr_gateway_server::state::AppState::new(
            check_service,
            file_server,
        ));

        let router = omr_gateway_server::api::create_router(state);

        Self {
            router,
            engine,
            templates,
            temp_dir,
        }
    }

    /// Entries left in the workspace root.
    pub fn workspace_entries(&self) -> usize {
        std::fs::read_dir(self.templates.temp_dir())
            .expect("read workspace root")
            .count()
    }

    /// Send a GET request and parse the body as JSON.
    pub async fn get(&self, path: &str) -> TestResponse {
        let (status, _, bytes) = self.get_raw(path).await;
        TestResponse {
            status,
            body: parse_json(&bytes),
        }
    }

    /// Send a GET request and return the raw response parts.
    pub async fn get_raw(&self, path: &str) -> (StatusCode, HeaderMap, Bytes) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// POST a multipart form to `/check`, with an optional query string.
    pub async fn post_check(&self, query: &str, form: MultipartForm) -> TestResponse {
        let uri = if query.is_empty() {
            "/check".to_string()
        } else {
            format!("/check?{}", query)
        };
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", form.content_type())
            .body(Body::from(form.into_body()))
            .unwrap();

        let (status, _, bytes) = self.send(request).await;
        TestResponse {
            status,
            body: parse_json(&bytes),
        }
    }

    /// POST a raw body with an arbitrary content type.
    pub async fn post_with_content_type(
        &self,
        path: &str,
        body: &[u8],
        content_type: &str,
    ) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body.to_vec()))
            .unwrap();

        let (status, _, bytes) = self.send(request).await;
        TestResponse {
            status,
            body: parse_json(&bytes),
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, headers, body_bytes)
    }
}

fn parse_json(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes).unwrap_or(Value::Null)
    }
}

/// Hand-built `multipart/form-data` body.
#[derive(Debug, Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name, filename
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", BOUNDARY)
    }

    pub fn into_body(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }
}

/// A small stand-in for a scanned sheet.
pub fn sheet_image() -> Vec<u8> {
    b"\x89PNG\r\n\x1a\n fake scanned sheet".to_vec()
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
