// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Tender Integration Tests
//!
//! Integration tests for the Tender procurement tracker, plus the fixtures
//! and harness they share.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Pre-built procurements, accounts and configuration
//!   - `harness`: An in-process API router with request helpers
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test -p tender-tests
//!
//! # Run specific test suite
//! cargo test -p tender-tests --test integration_manager
//! cargo test -p tender-tests --test integration_api
//! cargo test -p tender-tests --test integration_config
//! ```
//!
//! ## Test Categories
//!
//! ### Manager Tests (`integration_manager.rs`)
//! - The data manager against both storage backends
//! - Paging, id lists, law reference and creation date queries
//! - Error taxonomy for missing records and bad input
//!
//! ### API Tests (`integration_api.rs`)
//! - Signup, login, one-time codes
//! - Access policy decisions through the real router
//! - Procurement, management and extension endpoints
//!
//! ### Config Tests (`integration_config.rs`)
//! - YAML, TOML and JSON files
//! - Environment placeholders and overrides
//! - Validation rules
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use tender_tests::prelude::*;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let harness = ApiHarness::new();
//!     let token = harness.token_for("alice", &[Role::User]);
//!     let (status, body) = harness.get("/api/v1/procurements", Some(&token)).await;
//!     assert_eq!(status, StatusCode::OK);
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::fixtures::*;
    pub use crate::common::harness::*;
    pub use crate::common::{init_test_logging, temp_test_dir};
    pub use axum::http::StatusCode;
    pub use tender_core::{Procurement, ProcurementId, Role};
}
