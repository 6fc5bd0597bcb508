// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! JWT authentication middleware.
//!
//! Resolves the bearer token into an [`AuthContext`] and stores it in the
//! request extensions. This layer never rejects a request: anything short of
//! a valid token yields an anonymous context, and the access gate decides
//! what anonymous callers may reach.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request},
    response::Response,
};
use tower::{Layer, Service};
use uuid::Uuid;

use crate::auth::{AuthContext, JwtManager};

// =============================================================================
// AuthLayer
// =============================================================================

/// Layer for JWT authentication.
#[derive(Clone)]
pub struct AuthLayer {
    jwt_manager: Arc<JwtManager>,
}

impl AuthLayer {
    /// Creates a new auth layer.
    pub fn new(jwt_manager: Arc<JwtManager>) -> Self {
        Self { jwt_manager }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            jwt_manager: self.jwt_manager.clone(),
        }
    }
}

// =============================================================================
// AuthMiddleware
// =============================================================================

/// Middleware for JWT authentication.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    jwt_manager: Arc<JwtManager>,
}

impl<S> AuthMiddleware<S> {
    /// Builds the context for a request from its headers and connection info.
    fn resolve(&self, req: &Request<Body>) -> AuthContext {
        let client_ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip());

        let ctx = match extract_bearer_token(req) {
            Some(token) => match self.jwt_manager.validate_token(token) {
                Ok(claims) => AuthContext::from_claims(&claims),
                Err(e) => {
                    tracing::debug!(error = %e, path = %req.uri().path(), "Token rejected, continuing as anonymous");
                    AuthContext::anonymous()
                }
            },
            None => AuthContext::anonymous(),
        };

        ctx.with_request_id(Uuid::now_v7()).with_client_ip(client_ip)
    }
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        // Once per request: a context set by an outer layer is kept as is.
        if req.extensions().get::<AuthContext>().is_none() {
            let ctx = self.resolve(&req);
            tracing::trace!(
                user_id = %ctx.user_id,
                request_id = %ctx.request_id,
                authenticated = ctx.authenticated,
                "Resolved auth context"
            );
            req.extensions_mut().insert(ctx);
        }

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(req).await })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Extracts the bearer token from the Authorization header.
///
/// Returns `None` for a missing header, another scheme, or an empty token.
pub fn extract_bearer_token<B>(req: &Request<B>) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// =============================================================================
// Tests
// =============================================================================
