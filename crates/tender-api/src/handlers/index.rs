// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Index and health check handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::response::{ComponentStatus, HealthResponse, IndexResponse};
use crate::state::AppState;

/// GET /
pub async fn index() -> impl IntoResponse {
    Json(IndexResponse::current())
}

/// GET /health
///
/// Liveness plus a storage probe. Returns 503 when storage is unreachable.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.procurements().repository().backend_name();
    let storage = match state.procurements().health_check().await {
        Ok(()) => ComponentStatus {
            name: format!("storage:{backend}"),
            healthy: true,
            message: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, backend, "Storage health check failed");
            ComponentStatus {
                name: format!("storage:{backend}"),
                healthy: false,
                message: Some("Storage unavailable".to_string()),
            }
        }
    };

    let healthy = storage.healthy;
    let response = HealthResponse {
        status: if healthy { "ok" } else { "degraded" }.to_string(),
        version: crate::VERSION.to_string(),
        components: vec![storage],
    };

    if healthy {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;
    use crate::config::ApiConfig;

    #[tokio::test]
    async fn test_health_endpoint() {
        let config = ApiConfig::default().with_jwt(JwtConfig::new("test-secret-key-that-is-long-enough-for-testing"));
        let state = AppState::builder().config(config).build().unwrap();

        let response = health(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_index_endpoint() {
        let response = index().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
