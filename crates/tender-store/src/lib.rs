// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tender-store
//!
//! Storage backends for the Tender procurement tracker.
//!
//! - [`MemoryRepository`]: `parking_lot` guarded map, for tests and demos
//! - [`SqliteRepository`]: rusqlite on the blocking thread pool
//! - [`MemoryUserRepository`], [`SqliteUserRepository`]: user accounts
//! - [`LoginCodeStore`]: short-lived single-use sign-in codes

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod codes;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod users;

pub use codes::{IssuedCode, LoginCodeStore};
pub use memory::MemoryRepository;
pub use sqlite::SqliteRepository;
pub use users::{MemoryUserRepository, SqliteUserRepository};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
