//! Integration tests for the Camerazon catalog.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p camerazon-integration-tests
//! ```
//!
//! Each test builds a [`TestContext`]: the full catalog router backed by an
//! in-memory `SQLite` store and a [`ScriptedSource`] standing in for Shopify.
//! Requests are driven in-process with `tower::ServiceExt::oneshot`; no
//! server or network is needed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use camerazon_catalog::db::{bootstrap_schema, create_memory_pool};
use camerazon_catalog::routes;
use camerazon_catalog::shopify::{ProductSource, RemoteProduct, ShopifyError};
use camerazon_catalog::state::AppState;
use sqlx::SqlitePool;
use tower::ServiceExt;

/// Remote product source whose response can be changed between requests.
///
/// Holding `None` makes every fetch fail with a 503 API error.
#[derive(Default)]
pub struct ScriptedSource {
    products: Mutex<Option<Vec<RemoteProduct>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    /// Respond with `products` from now on.
    pub fn respond_with(&self, products: Vec<RemoteProduct>) {
        *self.products.lock().unwrap_or_else(PoisonError::into_inner) = Some(products);
    }

    /// Fail every fetch from now on.
    pub fn fail(&self) {
        *self.products.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Number of fetches made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductSource for ScriptedSource {
    async fn fetch_products(&self) -> Result<Vec<RemoteProduct>, ShopifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.products
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| ShopifyError::Api {
                status: 503,
                message: "Service Unavailable".to_string(),
            })
    }
}

/// A response captured from the router.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: String,
}

impl TestResponse {
    /// Parse the body as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not valid JSON.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|e| panic!("response is not JSON ({e}): {}", self.body))
    }
}

/// Router, store and remote source for one test.
pub struct TestContext {
    pub pool: SqlitePool,
    pub source: Arc<ScriptedSource>,
    app: Router,
}

impl TestContext {
    /// Build a context with empty tables and a failing remote source.
    ///
    /// # Panics
    ///
    /// Panics if the in-memory store cannot be created.
    pub async fn new() -> Self {
        let pool = create_memory_pool()
            .await
            .unwrap_or_else(|e| panic!("failed to open in-memory store: {e}"));
        bootstrap_schema(&pool)
            .await
            .unwrap_or_else(|e| panic!("failed to create tables: {e}"));

        let source = Arc::new(ScriptedSource::default());
        let state = AppState::new(pool.clone(), source.clone(), None);
        let app = routes::routes().with_state(state);

        Self { pool, source, app }
    }

    /// Send a request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn request(&self, method: Method, uri: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap_or_else(|e| panic!("invalid request: {e}"));

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|e| match e {});

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_else(|e| panic!("failed to read body: {e}"));

        TestResponse {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// `GET uri`.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, "").await
    }

    /// `POST uri` with `body`.
    pub async fn post(&self, uri: &str, body: &str) -> TestResponse {
        self.request(Method::POST, uri, body).await
    }

    /// Count rows in `table`.
    ///
    /// # Panics
    ///
    /// Panics if the query fails.
    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .unwrap_or_else(|e| panic!("count of {table} failed: {e}"))
    }
}

/// Build a remote product from JSON.
///
/// # Panics
///
/// Panics if `value` is not a valid product payload.
#[must_use]
pub fn remote_product(value: serde_json::Value) -> RemoteProduct {
    serde_json::from_value(value).unwrap_or_else(|e| panic!("invalid remote product: {e}"))
}
