// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication module.
//!
//! This module provides:
//! - JWT token issuing and validation
//! - The per-request authentication context
//! - Argon2 password hashing

mod claims;
mod context;
mod jwt;
pub mod password;

pub use claims::{Claims, ClaimsBuilder};
pub use context::AuthContext;
pub use jwt::{algorithm_from_name, JwtConfig, JwtManager};
pub use password::{hash_password, hash_password_async, verify_password, verify_password_async};
