// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Middleware implementations for the API server.
//!
//! - [`AuthMiddleware`]: resolves the bearer token into an `AuthContext`
//! - [`AccessMiddleware`]: enforces the `AccessPolicy`
//!
//! The auth layer must wrap the access layer so the gate sees the context.

mod access;
mod auth;

pub use access::{AccessLayer, AccessMiddleware};
pub use auth::{extract_bearer_token, AuthLayer, AuthMiddleware};
