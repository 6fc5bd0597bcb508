// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Access gate middleware.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::policy::{AccessPolicy, Decision};

// =============================================================================
// AccessLayer
// =============================================================================

/// Layer that checks every request against an [`AccessPolicy`].
///
/// Must sit inside [`AuthLayer`](super::AuthLayer). A request reaching the
/// gate without a context is judged as anonymous.
#[derive(Clone)]
pub struct AccessLayer {
    policy: Arc<AccessPolicy>,
}

impl AccessLayer {
    /// Creates a gate for the given policy.
    pub fn new(policy: Arc<AccessPolicy>) -> Self {
        Self { policy }
    }
}

impl<S> Layer<S> for AccessLayer {
    type Service = AccessMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessMiddleware {
            inner,
            policy: self.policy.clone(),
        }
    }
}

// =============================================================================
// AccessMiddleware
// =============================================================================

/// Middleware enforcing the access policy.
#[derive(Clone)]
pub struct AccessMiddleware<S> {
    inner: S,
    policy: Arc<AccessPolicy>,
}

impl<S> Service<Request<Body>> for AccessMiddleware<S>
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

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let anonymous;
        let ctx = match req.extensions().get::<AuthContext>() {
            Some(ctx) => ctx,
            None => {
                anonymous = AuthContext::anonymous();
                &anonymous
            }
        };

        let decision = self.policy.decide(req.method(), req.uri().path(), ctx);
        let rejection = match decision {
            Decision::Allow => None,
            Decision::Unauthenticated => {
                tracing::debug!(path = %req.uri().path(), method = %req.method(), "Authentication required");
                Some(ApiError::unauthorized("Authentication required"))
            }
            Decision::Forbidden => {
                tracing::warn!(
                    user_id = %ctx.user_id,
                    user_roles = ?ctx.roles,
                    path = %req.uri().path(),
                    method = %req.method(),
                    "Access denied"
                );
                Some(ApiError::forbidden("Insufficient role"))
            }
        };

        if let Some(err) = rejection {
            return Box::pin(async move { Ok(err.into_response()) });
        }

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(req).await })
    }
}

// =============================================================================
// Tests
// =============================================================================
