// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tender-bin
//!
//! CLI binary for the Tender procurement tracker.
//!
//! This crate provides the main binary entry point, including:
//!
//! - CLI argument parsing with clap
//! - Server runtime orchestration (storage, bootstrap accounts, API server)
//! - Graceful shutdown handling
//! - Logging initialization
//! - Command implementations (run, validate, version, gen-token, hash-password)
//!
//! ## Architecture
//!
//! ```text
//! main.rs -> cli.rs -> commands -> runtime -> tender-api server
//!                          |           |
//!                       logging     shutdown
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the server (default command)
//! tender
//!
//! # Start with custom config
//! tender -c /etc/tender/tender.yaml
//!
//! # Validate configuration
//! tender validate
//!
//! # Mint a token for the browser extension
//! tender gen-token extension --role ROLE_CHROME_EXTENSION
//!
//! # Hash a password for manual provisioning
//! tender hash-password --stdin
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;

// =============================================================================
// Re-exports
// =============================================================================

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::{RuntimeBuilder, ServerRuntime};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
