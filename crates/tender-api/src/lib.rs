// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tender-api
//!
//! REST API server for the Tender procurement tracker.
//!
//! This crate provides the HTTP surface: stateless JWT authentication, an
//! ordered access policy evaluated before every handler, and the procurement,
//! management and browser-extension endpoints.
//!
//! ## Request flow
//!
//! ```text
//! request -> AuthLayer (token -> AuthContext) -> AccessLayer (policy) -> handler
//!         -> ProcurementDataManager -> ProcurementRepository
//! ```
//!
//! A missing or broken token never fails a request on its own; the request
//! continues as anonymous and the access policy decides whether that is
//! enough.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod policy;
pub mod response;
pub mod server;
pub mod state;

pub use auth::{AuthContext, Claims, JwtConfig, JwtManager};
pub use config::{ApiConfig, CorsConfig};
pub use error::{ApiError, ApiResult};
pub use policy::{AccessPolicy, AccessRule, Decision, PathPattern, Requirement};
pub use server::{ApiServer, ApiServerBuilder};
pub use state::{AppState, AppStateBuilder};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
