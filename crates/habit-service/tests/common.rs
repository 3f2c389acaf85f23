//! Common test utilities for habit service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue};
use axum::Router;
use axum_test::{TestRequest, TestServer};
use tempfile::TempDir;

use habit_core::UserId;
use habit_service::{create_router, AppState, ServiceConfig};
use habit_store::RocksStore;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RocksStore::open(temp_dir.path()).expect("Failed to open store");

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            ..ServiceConfig::default()
        };

        let state = AppState::new(Arc::new(store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        let test_user_id = UserId::generate();

        Self {
            server,
            _temp_dir: temp_dir,
            test_user_id,
        }
    }

    /// Authorization header for the test user.
    pub fn user_auth(&self) -> (HeaderName, HeaderValue) {
        auth_for(&self.test_user_id)
    }

    /// Authorization header for a fresh, unrelated user (for isolation tests).
    pub fn other_user_auth() -> (HeaderName, HeaderValue) {
        auth_for(&UserId::generate())
    }

    pub fn get(&self, path: &str) -> TestRequest {
        let (name, value) = self.user_auth();
        self.server.get(path).add_header(name, value)
    }

    pub fn post(&self, path: &str) -> TestRequest {
        let (name, value) = self.user_auth();
        self.server.post(path).add_header(name, value)
    }

    pub fn patch(&self, path: &str) -> TestRequest {
        let (name, value) = self.user_auth();
        self.server.patch(path).add_header(name, value)
    }

    pub fn delete(&self, path: &str) -> TestRequest {
        let (name, value) = self.user_auth();
        self.server.delete(path).add_header(name, value)
    }

    /// Create a habit and return its ID.
    pub async fn create_habit(&self, name: &str) -> String {
        let response = self
            .post("/v1/habits")
            .json(&serde_json::json!({ "name": name }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        body["id"].as_str().expect("habit id").to_string()
    }

    /// Complete a habit on a date and return the response body.
    pub async fn complete(&self, habit_id: &str, date: &str) -> serde_json::Value {
        let response = self
            .patch(&format!("/v1/habits/{habit_id}"))
            .json(&serde_json::json!({ "date": date }))
            .await;
        response.assert_status_ok();
        response.json()
    }
}

fn auth_for(user_id: &UserId) -> (HeaderName, HeaderValue) {
    let value = HeaderValue::from_str(&format!("Bearer test-token:{user_id}"))
        .expect("valid header value");
    (header::AUTHORIZATION, value)
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
