//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per route. When routes or the auth header
//! change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::Value;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    /// Value sent in the admin header, if any
    token: Option<String>,
}

impl TestClient {
    /// Client that never sends the admin header
    pub fn anonymous(base_url: String) -> Self {
        Self::with_token(base_url, None)
    }

    /// Client that sends the right admin token on every request
    pub fn admin(base_url: String) -> Self {
        Self::with_token(base_url, Some(ADMIN_TOKEN))
    }

    /// Client that sends an arbitrary (usually wrong) admin token
    pub fn with_token(base_url: String, token: Option<&str>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            token: token.map(str::to_owned),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.header(ADMIN_TOKEN_HEADER, token),
            None => builder,
        }
    }

    /// GET /
    pub async fn home(&self) -> Response {
        self.request(reqwest::Method::GET, "/")
            .send()
            .await
            .expect("Home request failed")
    }

    /// GET /api/dramas?{query}
    pub async fn list_dramas(&self, query: &str) -> Response {
        self.request(reqwest::Method::GET, &format!("/api/dramas?{}", query))
            .send()
            .await
            .expect("List request failed")
    }

    /// GET /api/dramas/{id}
    pub async fn get_drama(&self, id: &str) -> Response {
        self.request(reqwest::Method::GET, &format!("/api/dramas/{}", id))
            .send()
            .await
            .expect("Detail request failed")
    }

    /// POST /api/dramas
    pub async fn create_drama(&self, body: &Value) -> Response {
        self.request(reqwest::Method::POST, "/api/dramas")
            .json(body)
            .send()
            .await
            .expect("Create request failed")
    }

    /// POST /api/dramas with a raw, possibly malformed body
    pub async fn create_drama_raw(&self, body: &str) -> Response {
        self.request(reqwest::Method::POST, "/api/dramas")
            .header("content-type", "application/json")
            .body(body.to_owned())
            .send()
            .await
            .expect("Create request failed")
    }

    /// PUT /api/dramas/{id}
    pub async fn update_drama(&self, id: &str, body: &Value) -> Response {
        self.request(reqwest::Method::PUT, &format!("/api/dramas/{}", id))
            .json(body)
            .send()
            .await
            .expect("Update request failed")
    }

    /// DELETE /api/dramas/{id}
    pub async fn delete_drama(&self, id: &str) -> Response {
        self.request(reqwest::Method::DELETE, &format!("/api/dramas/{}", id))
            .send()
            .await
            .expect("Delete request failed")
    }

    /// POST /api/seed, with `?count=` only when given
    pub async fn seed(&self, count: Option<&str>) -> Response {
        let path = match count {
            Some(count) => format!("/api/seed?count={}", count),
            None => "/api/seed".to_owned(),
        };
        self.request(reqwest::Method::POST, &path)
            .send()
            .await
            .expect("Seed request failed")
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Creates a drama and returns its JSON, asserting a 201
    pub async fn create_ok(&self, body: &Value) -> Value {
        let response = self.create_drama(body).await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        response.json().await.expect("Create response is not JSON")
    }

    /// Total number of dramas as reported by the list endpoint
    pub async fn total(&self) -> u64 {
        let body: Value = self
            .list_dramas("")
            .await
            .json()
            .await
            .expect("List response is not JSON");
        body["total"].as_u64().expect("total is not a number")
    }
}
