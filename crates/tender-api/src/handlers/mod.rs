// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API handlers for all endpoints.
//!
//! - [`index`]: index page and health check
//! - [`auth`]: sign-in, signup, one-time codes, current principal
//! - [`procurements`]: procurement reads and writes for signed-in users
//! - [`management`]: deletes, user administration and code issuing
//! - [`chrome`]: business-key endpoints used by the browser extension

mod auth;
mod chrome;
mod index;
mod management;
mod procurements;

pub use auth::*;
pub use chrome::*;
pub use index::*;
pub use management::*;
pub use procurements::*;

use tender_core::ProcurementId;

use crate::error::{ApiError, ApiResult};

/// Parses a procurement id path segment.
pub(crate) fn parse_id(raw: &str) -> ApiResult<ProcurementId> {
    raw.trim()
        .parse::<i64>()
        .map(ProcurementId::new)
        .map_err(|_| ApiError::bad_request(format!("'{raw}' is not a valid procurement id")))
}

/// Parses a law reference number path segment.
pub(crate) fn parse_fz_number(raw: &str) -> ApiResult<i32> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| ApiError::bad_request(format!("'{raw}' is not a valid FZ number")))
}
