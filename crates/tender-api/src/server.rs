// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    routing::{delete, get, post, put},
    Router,
};
use tender_core::{ProcurementRepository, UserRepository};
use tender_store::LoginCodeStore;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::auth::JwtManager;
use crate::config::{ApiConfig, CorsConfig};
use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::middleware::{AccessLayer, AuthLayer};
use crate::policy::AccessPolicy;
use crate::state::AppState;

// =============================================================================
// ApiServer
// =============================================================================

/// The API server.
///
/// This is the main entry point for creating and running the HTTP server.
pub struct ApiServer {
    state: AppState,
    config: Arc<ApiConfig>,
}

impl ApiServer {
    /// Creates a new API server with the given state.
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        Self { state, config }
    }

    /// Creates the router with all routes and middleware.
    ///
    /// Layers run outermost first: tracing, timeout, CORS, token resolution,
    /// then the access gate.
    pub fn router(&self) -> Router {
        let cors = self
            .config
            .cors
            .enabled
            .then(|| create_cors_layer(&self.config.cors));

        let middleware_stack = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.config.request_timeout(),
            ))
            .option_layer(cors)
            .layer(AuthLayer::new(self.state.jwt_manager.clone()))
            .layer(AccessLayer::new(self.state.policy.clone()));

        Router::new()
            // Public
            .route("/", get(handlers::index))
            .route("/health", get(handlers::health))
            // Auth
            .route("/v1/auth/login", post(handlers::login))
            .route("/v1/auth/signup", post(handlers::signup))
            .route("/v1/auth/code/{code}", get(handlers::redeem_code))
            .route("/v1/auth/me", get(handlers::current_user))
            .route("/v1/auth/test/jwt", get(handlers::test_jwt))
            // Procurements
            .route(
                "/api/v1/procurements",
                get(handlers::list_procurements).post(handlers::create_procurement),
            )
            .route(
                "/api/v1/procurements/{id}",
                get(handlers::get_procurement).put(handlers::replace_procurement),
            )
            .route("/api/v1/procurements/fz/{fz_number}", get(handlers::list_by_fz_number))
            .route(
                "/api/v1/procurements/created-before/{date}",
                get(handlers::list_created_before),
            )
            // Management
            .route(
                "/api/v1/management/procurements/{id}",
                delete(handlers::delete_procurement),
            )
            .route(
                "/api/v1/management/users",
                get(handlers::list_users).post(handlers::create_user),
            )
            .route(
                "/api/v1/management/users/{user_name}/status",
                put(handlers::update_user_status),
            )
            .route("/api/v1/management/codes", post(handlers::issue_login_code))
            // Browser extension
            .route("/v1/chrome/procurements", post(handlers::upsert_procurement))
            .route(
                "/v1/chrome/procurements/{fz_number}/{uin}",
                get(handlers::lookup_procurement),
            )
            .layer(DefaultBodyLimit::max(self.config.max_body_size))
            .layer(middleware_stack)
            .with_state(self.state.clone())
    }

    /// Runs the server.
    pub async fn run(self) -> ApiResult<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Runs the server with graceful shutdown.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.config.socket_addr();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind {addr}: {e}")))?;

        self.serve(listener, shutdown_signal).await
    }

    /// Serves on an already bound listener until `shutdown_signal` resolves.
    pub async fn serve(
        self,
        listener: tokio::net::TcpListener,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let router = self.router();
        let addr = listener.local_addr().unwrap_or_else(|_| self.addr());

        info!(
            %addr,
            storage = self.state.procurements().repository().backend_name(),
            "Starting API server"
        );

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ApiError::internal(format!("Server error: {e}")))?;

        info!("API server shutdown complete");
        Ok(())
    }

    /// Returns the configured server address.
    pub fn addr(&self) -> SocketAddr {
        self.config.socket_addr()
    }

    /// Returns the shared state.
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Creates the CORS layer from configuration.
///
/// Origins that are not valid header values are skipped with a warning.
fn create_cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origin = if cors.allows_any_origin() {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = cors
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(cors.max_age_secs))
}

// =============================================================================
// Server Builder
// =============================================================================

/// Builder for creating the API server.
pub struct ApiServerBuilder {
    state_builder: crate::state::AppStateBuilder,
}

impl ApiServerBuilder {
    /// Creates a new server builder.
    pub fn new() -> Self {
        Self {
            state_builder: AppState::builder(),
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.state_builder = self.state_builder.config(config);
        self
    }

    /// Sets the JWT manager.
    pub fn jwt_manager(mut self, manager: Arc<JwtManager>) -> Self {
        self.state_builder = self.state_builder.jwt_manager(manager);
        self
    }

    /// Sets the access policy.
    pub fn policy(mut self, policy: AccessPolicy) -> Self {
        self.state_builder = self.state_builder.policy(Arc::new(policy));
        self
    }

    /// Sets the procurement repository.
    pub fn repository(mut self, repository: Arc<dyn ProcurementRepository>) -> Self {
        self.state_builder = self.state_builder.repository(repository);
        self
    }

    /// Sets the user repository.
    pub fn users(mut self, users: Arc<dyn UserRepository>) -> Self {
        self.state_builder = self.state_builder.users(users);
        self
    }

    /// Sets the login code store.
    pub fn login_codes(mut self, codes: Arc<LoginCodeStore>) -> Self {
        self.state_builder = self.state_builder.login_codes(codes);
        self
    }

    /// Builds the server.
    pub fn build(self) -> ApiResult<ApiServer> {
        let state = self.state_builder.build()?;
        Ok(ApiServer::new(state))
    }
}

impl Default for ApiServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;
    use axum::body::Body;
    use axum::http::Request;
    use tender_core::Role;
    use tower::ServiceExt;

    fn test_config() -> ApiConfig {
        ApiConfig::default().with_jwt(JwtConfig::new("test-secret-key-that-is-long-enough"))
    }

    fn test_server() -> ApiServer {
        ApiServerBuilder::new().config(test_config()).build().unwrap()
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_server_builder() {
        let server = test_server();
        assert_eq!(server.addr().port(), 8080);
        assert_eq!(server.state().procurements().repository().backend_name(), "memory");
    }

    #[test]
    fn test_cors_layer_with_origin_list() {
        let cors = CorsConfig {
            enabled: true,
            allowed_origins: vec!["https://example.org".into(), "bad\norigin".into()],
            max_age_secs: 60,
        };
        let _layer = create_cors_layer(&cors);
    }

    #[tokio::test]
    async fn test_public_routes_need_no_token() {
        let router = test_server().router();

        let response = router.clone().oneshot(get("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router.oneshot(get("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_gate_runs_before_handlers() {
        let server = test_server();
        let router = server.router();

        let response = router
            .clone()
            .oneshot(get("/api/v1/procurements", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let user = server
            .state()
            .jwt()
            .create_access_token("alice", &[Role::User])
            .unwrap();

        let response = router
            .clone()
            .oneshot(get("/api/v1/procurements", Some(&user)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .clone()
            .oneshot(get("/api/v1/management/users", Some(&user)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = router
            .oneshot(get("/v1/auth/test/jwt", Some(&user)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_bad_path_id_is_bad_request() {
        let server = test_server();
        let token = server
            .state()
            .jwt()
            .create_access_token("alice", &[Role::User])
            .unwrap();

        let response = server
            .router()
            .oneshot(get("/api/v1/procurements/abc", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
