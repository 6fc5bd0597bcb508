// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tender-core
//!
//! Domain model and data access contracts for the Tender procurement tracker.
//!
//! This crate provides:
//!
//! - The [`Procurement`] record and its identifiers
//! - Zero-based paging ([`PageRequest`], [`Page`])
//! - Storage contracts ([`ProcurementRepository`], [`UserRepository`])
//! - The [`ProcurementDataManager`] service with a structured error taxonomy
//! - User accounts and the fixed [`Role`] set
//!
//! ## Error Taxonomy
//!
//! ```text
//! DataManagerError
//! ├── NullInput          - required identifier or record missing
//! ├── NotFound           - no record with the given id
//! ├── NotFoundByKey      - no record with the given UIN + FZ number
//! ├── NonExistingDelete  - delete of an id that is not stored
//! ├── InvalidPage        - page request with zero size
//! └── Storage            - storage backend failure
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod manager;
pub mod page;
pub mod procurement;
pub mod repository;
pub mod role;
pub mod user;

pub use error::{DataManagerError, DataResult, StoreError, StoreResult};
pub use manager::ProcurementDataManager;
pub use page::{Page, PageRequest};
pub use procurement::{Procurement, ProcurementId};
pub use repository::ProcurementRepository;
pub use role::Role;
pub use user::{UserAccount, UserCheck, UserId, UserRepository, UserStatus};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
