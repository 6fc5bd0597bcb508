// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # API Harness
//!
//! Drives the full router (middleware stack included) in-process with
//! `tower::ServiceExt::oneshot`, without binding a socket.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tender_api::auth::hash_password;
use tender_api::{ApiConfig, ApiServer, ApiServerBuilder, AppState};
use tender_core::{ProcurementRepository, Role, UserAccount, UserStatus};
use tower::ServiceExt;

use super::fixtures::{ConfigFixtures, TEST_PASSWORD};

// =============================================================================
// ApiHarness
// =============================================================================

/// An in-process API server with in-memory users and login codes.
pub struct ApiHarness {
    server: ApiServer,
    router: Router,
}

impl ApiHarness {
    /// Creates a harness backed by an in-memory procurement repository.
    pub fn new() -> Self {
        Self::with_config(ConfigFixtures::api())
    }

    /// Creates a harness with the given configuration.
    pub fn with_config(config: ApiConfig) -> Self {
        let server = ApiServerBuilder::new()
            .config(config)
            .build()
            .expect("Failed to build API server");
        Self::from_server(server)
    }

    /// Creates a harness over the given procurement repository.
    pub fn with_repository(repository: Arc<dyn ProcurementRepository>) -> Self {
        let server = ApiServerBuilder::new()
            .config(ConfigFixtures::api())
            .repository(repository)
            .build()
            .expect("Failed to build API server");
        Self::from_server(server)
    }

    fn from_server(server: ApiServer) -> Self {
        let router = server.router();
        Self { server, router }
    }

    /// Shared application state.
    pub fn state(&self) -> &AppState {
        self.server.state()
    }

    /// Signs a token for `user_name` without creating an account.
    pub fn token_for(&self, user_name: &str, roles: &[Role]) -> String {
        self.state()
            .jwt()
            .create_access_token(user_name, roles)
            .expect("Failed to sign token")
    }

    /// Creates an account with [`TEST_PASSWORD`].
    pub async fn add_user(&self, user_name: &str, roles: &[Role]) -> UserAccount {
        let hash = hash_password(TEST_PASSWORD).expect("Failed to hash password");
        let account = UserAccount::new(
            user_name,
            format!("{user_name}@example.org"),
            hash,
            roles.to_vec(),
        );
        self.state()
            .users()
            .insert(account)
            .await
            .expect("Failed to insert user")
    }

    /// Changes the status of an existing account.
    pub async fn set_status(&self, user_name: &str, status: UserStatus) {
        let updated = self
            .state()
            .users()
            .set_status(user_name, status)
            .await
            .expect("Failed to update status");
        assert!(updated, "unknown user {user_name}");
    }

    /// Creates an administrator account and returns a token for it.
    pub async fn admin_token(&self) -> String {
        self.add_user("root", &[Role::Admin]).await;
        self.token_for("root", &[Role::Admin])
    }

    // -------------------------------------------------------------------------
    // Requests
    // -------------------------------------------------------------------------

    /// Sends a GET request.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    /// Sends a POST request with a JSON body.
    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    /// Sends a PUT request with a JSON body.
    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    /// Sends a DELETE request.
    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, token, None).await
    }

    /// Sends a request and decodes the body as JSON (`Null` when empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }
}

impl Default for ApiHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts the machine-readable code of an error body.
pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}
