// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for procurement data access.
//!
//! Callers at the HTTP boundary need to tell a missing identifier apart from
//! a missing record and from a delete of something that was never stored, so
//! each condition has its own variant instead of a generic message.
//!
//! # Examples
//!
//! ```
//! use tender_core::error::DataManagerError;
//! use tender_core::ProcurementId;
//!
//! let err = DataManagerError::non_existing_delete(ProcurementId::new(8765));
//! assert_eq!(
//!     err.to_string(),
//!     "Procurement with id 8765 does not exist and cannot be deleted"
//! );
//! assert!(err.is_not_found());
//! ```

use thiserror::Error;

use crate::procurement::ProcurementId;

/// Result type alias for data manager operations.
pub type DataResult<T> = Result<T, DataManagerError>;

/// Result type alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// DataManagerError
// =============================================================================

/// Errors raised by the procurement data manager.
#[derive(Debug, Error)]
pub enum DataManagerError {
    /// A required identifier or record was absent.
    #[error("Could not {operation} procurement: null data")]
    NullInput {
        /// The operation that received the null input.
        operation: &'static str,
    },

    /// No record with the given id exists.
    #[error("Procurement with id {id} was not found")]
    NotFound {
        /// The requested id.
        id: ProcurementId,
    },

    /// No record with the given business key exists.
    #[error("Procurement with UIN '{uin}' and FZ number {fz_number} was not found")]
    NotFoundByKey {
        /// Unique procurement identifier from the registry.
        uin: String,
        /// Law reference number.
        fz_number: i32,
    },

    /// Delete was requested for an id that is not stored.
    #[error("Procurement with id {id} does not exist and cannot be deleted")]
    NonExistingDelete {
        /// The id that was not found.
        id: ProcurementId,
    },

    /// The page request is unusable.
    #[error("Invalid page request: {message}")]
    InvalidPage {
        /// Error message.
        message: String,
    },

    /// The storage backend failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl DataManagerError {
    /// Creates a null input error for the given operation.
    pub fn null_input(operation: &'static str) -> Self {
        Self::NullInput { operation }
    }

    /// Creates a not found error.
    pub fn not_found(id: ProcurementId) -> Self {
        Self::NotFound { id }
    }

    /// Creates a business-key not found error.
    pub fn not_found_by_key(uin: impl Into<String>, fz_number: i32) -> Self {
        Self::NotFoundByKey {
            uin: uin.into(),
            fz_number,
        }
    }

    /// Creates a non-existing delete error.
    pub fn non_existing_delete(id: ProcurementId) -> Self {
        Self::NonExistingDelete { id }
    }

    /// Creates an invalid page error.
    pub fn invalid_page(message: impl Into<String>) -> Self {
        Self::InvalidPage {
            message: message.into(),
        }
    }

    /// Returns `true` if the error describes a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::NotFoundByKey { .. } | Self::NonExistingDelete { .. }
        )
    }

    /// Returns `true` if the error was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NullInput { .. } | Self::InvalidPage { .. }) || self.is_not_found()
    }

    /// Returns the error kind as a string for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NullInput { .. } => "null_input",
            Self::NotFound { .. } => "not_found",
            Self::NotFoundByKey { .. } => "not_found_by_key",
            Self::NonExistingDelete { .. } => "non_existing_delete",
            Self::InvalidPage { .. } => "invalid_page",
            Self::Storage(_) => "storage",
        }
    }
}

// =============================================================================
// StoreError
// =============================================================================

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend query or connection failure.
    #[error("Backend error: {message}")]
    Backend {
        /// Error message.
        message: String,
    },

    /// A stored value could not be converted.
    #[error("Corrupt value in column '{column}': {message}")]
    CorruptValue {
        /// Column or field name.
        column: String,
        /// Error message.
        message: String,
    },

    /// A uniqueness constraint was violated.
    #[error("Constraint violated: {message}")]
    Constraint {
        /// Error message.
        message: String,
    },

    /// The backend is not available.
    #[error("Storage unavailable: {message}")]
    Unavailable {
        /// Error message.
        message: String,
    },
}

impl StoreError {
    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Creates a corrupt value error.
    pub fn corrupt(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptValue {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Creates a constraint error.
    pub fn constraint(message: impl Into<String>) -> Self {
        Self::Constraint {
            message: message.into(),
        }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a constraint violation.
    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint { .. })
    }
}

// =============================================================================
// Tests
// =============================================================================
