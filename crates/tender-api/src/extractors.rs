// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Custom extractors for API handlers.

use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use tender_core::PageRequest;

use crate::auth::AuthContext;
use crate::error::ApiError;

// =============================================================================
// Auth Extractor
// =============================================================================

/// Extractor for authenticated requests.
///
/// Extracts the `AuthContext` from the request extensions. Returns 401 if
/// the caller is anonymous.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Auth(ctx): Auth) -> impl IntoResponse {
///     format!("Hello, {}", ctx.user_id)
/// }
/// ```
pub struct Auth(pub AuthContext);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .filter(|ctx| !ctx.is_anonymous())
            .map(Auth)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

// =============================================================================
// Validated JSON Extractor
// =============================================================================

/// Extractor for JSON payloads.
///
/// Deserializes the body, turning framework rejections into `ApiError`s so
/// malformed input gets the same error body as everything else.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e.body_text())))?;

        Ok(ValidatedJson(value))
    }
}

// =============================================================================
// Paging Extractor
// =============================================================================

/// Extractor for `?page=&size=` query parameters.
///
/// Both are optional; bounds are checked by the data manager.
pub struct Paging(pub PageRequest);

impl<S> FromRequestParts<S> for Paging
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(page) = Query::<PageRequest>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid paging parameters: {}", e.body_text())))?;

        Ok(Paging(page))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use tender_core::Role;

    use crate::auth::Claims;

    fn parts(uri: &str, ctx: Option<AuthContext>) -> Parts {
        let mut req = HttpRequest::builder().uri(uri).body(Body::empty()).unwrap();
        if let Some(ctx) = ctx {
            req.extensions_mut().insert(ctx);
        }
        req.into_parts().0
    }

    #[tokio::test]
    async fn test_auth_rejects_anonymous() {
        let mut p = parts("/", Some(AuthContext::anonymous()));
        assert!(Auth::from_request_parts(&mut p, &()).await.is_err());

        let mut p = parts("/", None);
        assert!(Auth::from_request_parts(&mut p, &()).await.is_err());

        let ctx = AuthContext::from_claims(&Claims::new("alice", &[Role::User], 60));
        let mut p = parts("/", Some(ctx));
        let Auth(resolved) = Auth::from_request_parts(&mut p, &()).await.unwrap();
        assert_eq!(resolved.user_id, "alice");
    }

    #[tokio::test]
    async fn test_paging_defaults_and_values() {
        let mut p = parts("/items", None);
        let Paging(page) = Paging::from_request_parts(&mut p, &()).await.unwrap();
        assert_eq!(page, PageRequest::default());

        let mut p = parts("/items?page=3&size=5", None);
        let Paging(page) = Paging::from_request_parts(&mut p, &()).await.unwrap();
        assert_eq!(page, PageRequest::of(3, 5));

        let mut p = parts("/items?page=minus-one", None);
        assert!(Paging::from_request_parts(&mut p, &()).await.is_err());
    }
}
