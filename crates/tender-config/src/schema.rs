// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema for Tender.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tender_core::Role;

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Constants
// =============================================================================

/// Default API port.
pub const DEFAULT_API_PORT: u16 = 8080;

/// Default JWT expiration in seconds (24 hours).
pub const DEFAULT_JWT_EXPIRATION_SECS: u64 = 86_400;

/// Default clock skew tolerance for token validation.
pub const DEFAULT_JWT_LEEWAY_SECS: u64 = 30;

/// Minimum HMAC secret length in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Default login code lifetime in seconds.
pub const DEFAULT_LOGIN_CODE_TTL_SECS: u64 = 600;

fn default_enabled() -> bool {
    true
}

// =============================================================================
// Top-Level Configuration
// =============================================================================

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenderConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Token and sign-in configuration.
    #[serde(default)]
    pub security: SecurityConfig,

    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Accounts created on startup.
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl TenderConfig {
    /// Validates the entire configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.security.validate()?;
        self.storage.validate()?;
        self.bootstrap.validate()?;
        Ok(())
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    /// Listen port.
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
}

fn default_api_port() -> u16 {
    DEFAULT_API_PORT
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_size() -> usize {
    2 * 1024 * 1024 // 2MB
}

impl ServerConfig {
    /// Validates the server configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(ConfigError::validation("server.port", "cannot be zero"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout_secs",
                "cannot be zero",
            ));
        }
        if self.max_body_size == 0 {
            return Err(ConfigError::validation(
                "server.max_body_size",
                "cannot be zero",
            ));
        }
        Ok(())
    }

    /// Returns the request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the socket address.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: DEFAULT_API_PORT,
            request_timeout_secs: default_request_timeout(),
            max_body_size: default_max_body_size(),
            cors: CorsConfig::default(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Whether CORS headers are sent.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Allowed origins. Empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Max age in seconds.
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,
}

fn default_max_age() -> u64 {
    3600
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: Vec::new(),
            max_age_secs: default_max_age(),
        }
    }
}

// =============================================================================
// Security Configuration
// =============================================================================

/// Token and sign-in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityConfig {
    /// JWT configuration.
    #[serde(default)]
    pub jwt: JwtSettings,

    /// Lifetime of one-time login codes in seconds.
    #[serde(default = "default_login_code_ttl")]
    pub login_code_ttl_secs: u64,

    /// Whether public sign-up is open.
    #[serde(default = "default_enabled")]
    pub signup_enabled: bool,
}

fn default_login_code_ttl() -> u64 {
    DEFAULT_LOGIN_CODE_TTL_SECS
}

impl SecurityConfig {
    /// Validates the security configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.jwt.validate()?;
        if self.login_code_ttl_secs == 0 {
            return Err(ConfigError::validation(
                "security.login_code_ttl_secs",
                "cannot be zero",
            ));
        }
        Ok(())
    }

    /// Returns the login code lifetime.
    pub fn login_code_ttl(&self) -> Duration {
        Duration::from_secs(self.login_code_ttl_secs)
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt: JwtSettings::default(),
            login_code_ttl_secs: DEFAULT_LOGIN_CODE_TTL_SECS,
            signup_enabled: true,
        }
    }
}

/// JWT settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JwtSettings {
    /// HMAC signing secret.
    #[serde(default)]
    pub secret: Option<SecretValue>,

    /// Token expiration in seconds.
    #[serde(default = "default_jwt_expiration")]
    pub expiration_secs: u64,

    /// Token issuer.
    #[serde(default = "default_jwt_issuer")]
    pub issuer: String,

    /// Signing algorithm.
    #[serde(default)]
    pub algorithm: JwtAlgorithm,

    /// Clock skew tolerance in seconds.
    #[serde(default = "default_jwt_leeway")]
    pub leeway_secs: u64,
}

fn default_jwt_expiration() -> u64 {
    DEFAULT_JWT_EXPIRATION_SECS
}

fn default_jwt_issuer() -> String {
    "tender".to_string()
}

fn default_jwt_leeway() -> u64 {
    DEFAULT_JWT_LEEWAY_SECS
}

impl JwtSettings {
    /// Validates the JWT settings.
    pub fn validate(&self) -> ConfigResult<()> {
        let secret = self
            .secret
            .as_ref()
            .ok_or_else(|| ConfigError::missing_field("security.jwt.secret"))?;
        if secret.expose().len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::validation(
                "security.jwt.secret",
                format!("must be at least {MIN_JWT_SECRET_LEN} bytes"),
            ));
        }
        if self.expiration_secs == 0 {
            return Err(ConfigError::validation(
                "security.jwt.expiration_secs",
                "cannot be zero",
            ));
        }
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::validation(
                "security.jwt.issuer",
                "cannot be empty",
            ));
        }
        Ok(())
    }

    /// Returns the expiration as a Duration.
    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration_secs)
    }
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            secret: None,
            expiration_secs: DEFAULT_JWT_EXPIRATION_SECS,
            issuer: default_jwt_issuer(),
            algorithm: JwtAlgorithm::default(),
            leeway_secs: DEFAULT_JWT_LEEWAY_SECS,
        }
    }
}

/// JWT signing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JwtAlgorithm {
    /// HMAC using SHA-256.
    #[default]
    HS256,
    /// HMAC using SHA-384.
    HS384,
    /// HMAC using SHA-512.
    HS512,
}

impl JwtAlgorithm {
    /// Parses an algorithm name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "HS256" => Some(Self::HS256),
            "HS384" => Some(Self::HS384),
            "HS512" => Some(Self::HS512),
            _ => None,
        }
    }

    /// Returns the JOSE algorithm name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
        }
    }
}

// =============================================================================
// Storage Configuration
// =============================================================================

/// Storage backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Backend kind.
    #[serde(default)]
    pub backend: StorageBackend,

    /// Database file for the SQLite backend.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("data/tender.db")
}

impl StorageConfig {
    /// Validates the storage configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.backend == StorageBackend::Sqlite && self.path.as_os_str().is_empty() {
            return Err(ConfigError::validation(
                "storage.path",
                "required for the sqlite backend",
            ));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
        }
    }
}

/// Storage backend kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory, lost on exit.
    Memory,
    /// SQLite database file.
    #[default]
    Sqlite,
}

impl StorageBackend {
    /// Parses a backend name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Returns the backend name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        }
    }
}

// =============================================================================
// Logging Configuration
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Log format.
    #[serde(default)]
    pub format: LogFormat,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Returns the level name.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parses a level name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Compact single-line text.
    Compact,
    /// JSON lines.
    Json,
}

impl LogFormat {
    /// Parses a format name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Some(LogFormat::Text),
            "compact" => Some(LogFormat::Compact),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

// =============================================================================
// Bootstrap Configuration
// =============================================================================

/// Accounts created on startup when missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapConfig {
    /// Initial accounts.
    #[serde(default)]
    pub users: Vec<BootstrapUser>,
}

impl BootstrapConfig {
    /// Validates the bootstrap accounts.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut names = std::collections::HashSet::new();
        for (i, user) in self.users.iter().enumerate() {
            let field = format!("bootstrap.users[{i}]");
            if user.user_name.trim().is_empty() {
                return Err(ConfigError::validation(
                    format!("{field}.user_name"),
                    "cannot be empty",
                ));
            }
            if !names.insert(user.user_name.as_str()) {
                return Err(ConfigError::validation(
                    format!("{field}.user_name"),
                    format!("duplicate user '{}'", user.user_name),
                ));
            }
            if user.password.expose().is_empty() {
                return Err(ConfigError::validation(
                    format!("{field}.password"),
                    "cannot be empty",
                ));
            }
            if let Some(unknown) = user.roles.iter().find(|r| Role::parse(r).is_none()) {
                return Err(ConfigError::validation(
                    format!("{field}.roles"),
                    format!("unknown role '{unknown}'"),
                ));
            }
        }
        Ok(())
    }
}

/// An account created on startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapUser {
    /// Login name.
    pub user_name: String,

    /// Contact email.
    #[serde(default)]
    pub email: String,

    /// Plain-text password, hashed on startup.
    pub password: SecretValue,

    /// Role names (`ROLE_*`).
    #[serde(default)]
    pub roles: Vec<String>,
}

impl BootstrapUser {
    /// Returns the parsed roles.
    pub fn parsed_roles(&self) -> Vec<Role> {
        Role::parse_all(self.roles.iter().map(String::as_str))
    }
}

// =============================================================================
// Secret Value
// =============================================================================

/// A secret string that is never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretValue(String);

impl SecretValue {
    /// Creates a new secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretValue(***)")
    }
}

impl std::fmt::Display for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> TenderConfig {
        let mut config = TenderConfig::default();
        config.security.jwt.secret = Some(SecretValue::new("x".repeat(MIN_JWT_SECRET_LEN)));
        config
    }

    #[test]
    fn test_default_requires_secret() {
        let err = TenderConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { ref field } if field == "security.jwt.secret"));
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = valid();
        config.security.jwt.secret = Some(SecretValue::new("short"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn test_bootstrap_rejects_unknown_role() {
        let mut config = valid();
        config.bootstrap.users.push(BootstrapUser {
            user_name: "admin".into(),
            email: String::new(),
            password: SecretValue::new("pw"),
            roles: vec!["ROLE_ADMIN".into(), "ROLE_ROOT".into()],
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ROLE_ROOT"));
    }

    #[test]
    fn test_secret_is_redacted() {
        let secret = SecretValue::new("hunter2");
        assert_eq!(secret.to_string(), "***");
        assert!(!format!("{secret:?}").contains("hunter2"));
    }

    #[test]
    fn test_parsers() {
        assert_eq!(LogLevel::parse("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogFormat::parse("pretty"), Some(LogFormat::Text));
        assert_eq!(StorageBackend::parse("Memory"), Some(StorageBackend::Memory));
        assert_eq!(JwtAlgorithm::parse("hs512"), Some(JwtAlgorithm::HS512));
        assert_eq!(JwtAlgorithm::parse("RS256"), None);
    }
}
