// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tender-config
//!
//! Configuration management for the Tender procurement tracker.
//!
//! ## Features
//!
//! - **Multi-Format Support**: YAML, TOML, and JSON configuration files
//! - **Environment Overrides**: `TENDER_*` variables override file values
//! - **Placeholders**: `${VAR}` and `${VAR:default}` inside files
//! - **Validation**: secret length, ports, storage path, bootstrap roles
//!
//! ## Quick Start
//!
//! ```no_run
//! use tender_config::loader::load_config;
//!
//! let config = load_config("tender.yaml").unwrap();
//! println!("Listening on {}", config.server.socket_addr());
//! ```
//!
//! ## Configuration Schema
//!
//! - `server` - bind address, port, timeouts, CORS
//! - `security` - JWT secret, issuer, expiry, login code lifetime
//! - `storage` - `memory` or `sqlite` and the database path
//! - `logging` - level and format
//! - `bootstrap` - accounts created on startup
//!
//! ```yaml
//! security:
//!   jwt:
//!     secret: "${TENDER_SECRET}"
//! storage:
//!   backend: sqlite
//!   path: "data/tender.db"
//! bootstrap:
//!   users:
//!     - user_name: admin
//!       password: "${ADMIN_PASSWORD:change-me}"
//!       roles: [ROLE_ADMIN]
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_config_str, ConfigFormat, ConfigLoader, ConfigLoaderBuilder};
pub use schema::{
    BootstrapConfig, BootstrapUser, CorsConfig, JwtAlgorithm, JwtSettings, LogFormat, LogLevel,
    LoggingConfig, SecretValue, SecurityConfig, ServerConfig, StorageBackend, StorageConfig,
    TenderConfig,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
