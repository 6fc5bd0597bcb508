// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Server runtime orchestration.
//!
//! Turns a validated [`TenderConfig`] into running components:
//!
//! - Storage backend selection (memory or SQLite)
//! - Bootstrap accounts
//! - API server with the access gate
//! - Login code maintenance and graceful shutdown

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::broadcast;
use tracing::{info, warn};

use tender_api::auth::{algorithm_from_name, hash_password};
use tender_api::{ApiConfig, ApiServerBuilder, CorsConfig, JwtConfig};
use tender_config::{load_config, BootstrapConfig, StorageBackend, TenderConfig};
use tender_core::{ProcurementRepository, UserAccount, UserRepository};
use tender_store::{LoginCodeStore, MemoryRepository, MemoryUserRepository, SqliteRepository};

use crate::error::{BinError, BinResult};
use crate::shutdown::{ShutdownCoordinator, ShutdownGuard};

/// How often expired login codes are dropped.
const CODE_PURGE_INTERVAL: Duration = Duration::from_secs(60);

// =============================================================================
// ServerRuntime
// =============================================================================

/// Owns the configuration and runs the server until shutdown.
pub struct ServerRuntime {
    config: Arc<TenderConfig>,
    shutdown: ShutdownCoordinator,
}

impl ServerRuntime {
    /// Creates a new runtime.
    pub fn new(config: TenderConfig) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: ShutdownCoordinator::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &TenderConfig {
        &self.config
    }

    /// Returns the shutdown coordinator.
    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Runs the server until a termination signal arrives.
    pub async fn run(self) -> BinResult<()> {
        info!("Starting Tender v{}", crate::VERSION);

        let components = self.initialize_components().await?;
        let server = ApiServerBuilder::new()
            .config(components.api_config)
            .repository(components.repository)
            .users(components.users)
            .login_codes(components.login_codes.clone())
            .build()?;

        let purge = tokio::spawn(purge_login_codes(
            components.login_codes,
            self.shutdown.subscribe(),
        ));

        let signals = {
            let shutdown = self.shutdown.clone();
            tokio::spawn(async move { shutdown.wait_for_os_signal().await })
        };

        let guard = ShutdownGuard::new(self.shutdown.clone());
        let result = server
            .run_with_shutdown(self.shutdown.shutdown_signal().wait())
            .await;
        drop(guard);

        signals.abort();
        if let Err(e) = purge.await {
            warn!(error = %e, "Login code maintenance task failed");
        }

        info!("Tender shutdown complete");
        result.map_err(BinError::from)
    }

    /// Opens storage, creates bootstrap accounts and derives the API config.
    async fn initialize_components(&self) -> BinResult<Components> {
        info!("Initializing components...");

        let api_config = api_config_from(&self.config)?;
        let Storage { repository, users } = open_storage(&self.config)?;

        let created = bootstrap_users(users.as_ref(), &self.config.bootstrap).await?;
        info!(created, "Bootstrap accounts ready");

        let login_codes = Arc::new(LoginCodeStore::new(self.config.security.login_code_ttl()));

        Ok(Components {
            api_config,
            repository,
            users,
            login_codes,
        })
    }
}

/// Components assembled before the server starts.
struct Components {
    api_config: ApiConfig,
    repository: Arc<dyn ProcurementRepository>,
    users: Arc<dyn UserRepository>,
    login_codes: Arc<LoginCodeStore>,
}

async fn purge_login_codes(codes: Arc<LoginCodeStore>, mut stop: broadcast::Receiver<()>) {
    let mut ticker = tokio::time::interval(CODE_PURGE_INTERVAL);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let purged = codes.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, "Dropped expired login codes");
                }
            }
            _ = stop.recv() => break,
        }
    }
}

// =============================================================================
// Component Construction
// =============================================================================

/// Derives the API configuration from the file configuration.
pub fn api_config_from(config: &TenderConfig) -> BinResult<ApiConfig> {
    let settings = &config.security.jwt;
    let secret = settings
        .secret
        .as_ref()
        .ok_or_else(|| BinError::config("security.jwt.secret is required"))?;
    let algorithm = algorithm_from_name(settings.algorithm.as_str()).ok_or_else(|| {
        BinError::config(format!(
            "unsupported JWT algorithm {}",
            settings.algorithm.as_str()
        ))
    })?;

    let jwt = JwtConfig::new(secret.expose())
        .with_issuer(settings.issuer.clone())
        .with_expiration(settings.expiration())
        .with_algorithm(algorithm)
        .with_leeway(settings.leeway_secs);

    let server = &config.server;
    let cors = CorsConfig {
        enabled: server.cors.enabled,
        allowed_origins: if server.cors.allowed_origins.is_empty() {
            vec!["*".to_string()]
        } else {
            server.cors.allowed_origins.clone()
        },
        max_age_secs: server.cors.max_age_secs,
    };

    Ok(ApiConfig {
        host: server.bind_address,
        port: server.port,
        cors,
        jwt,
        request_timeout_secs: server.request_timeout_secs,
        max_body_size: server.max_body_size,
        signup_enabled: config.security.signup_enabled,
        login_code_ttl_secs: config.security.login_code_ttl_secs,
    })
}

/// Procurement and account storage on one backend.
pub struct Storage {
    /// Procurement records.
    pub repository: Arc<dyn ProcurementRepository>,
    /// User accounts.
    pub users: Arc<dyn UserRepository>,
}

/// Opens the configured storage.
///
/// With SQLite, procurements and accounts share one database file.
pub fn open_storage(config: &TenderConfig) -> BinResult<Storage> {
    match config.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; records and accounts are lost on exit");
            Ok(Storage {
                repository: Arc::new(MemoryRepository::new()),
                users: Arc::new(MemoryUserRepository::new()),
            })
        }
        StorageBackend::Sqlite => {
            let repository = open_sqlite(&config.storage.path)?;
            info!(path = %config.storage.path.display(), "Opened SQLite storage");
            Ok(Storage {
                users: Arc::new(repository.users()),
                repository: Arc::new(repository),
            })
        }
    }
}

fn open_sqlite(path: &Path) -> anyhow::Result<SqliteRepository> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating storage directory {}", parent.display()))?;
    }
    SqliteRepository::open(path).with_context(|| format!("opening database {}", path.display()))
}

/// Creates the configured accounts that do not exist yet.
///
/// Existing accounts are left untouched. Returns the number of accounts
/// created.
pub async fn bootstrap_users(
    users: &dyn UserRepository,
    bootstrap: &BootstrapConfig,
) -> BinResult<usize> {
    let mut created = 0;

    for user in &bootstrap.users {
        if users.find_by_name(&user.user_name).await?.is_some() {
            info!(user = %user.user_name, "Bootstrap account already exists");
            continue;
        }

        let roles = user.parsed_roles();
        let account = UserAccount::new(
            user.user_name.clone(),
            user.email.clone(),
            hash_password(user.password.expose())?,
            if roles.is_empty() {
                vec![tender_core::Role::User]
            } else {
                roles
            },
        );
        users.insert(account).await?;
        created += 1;
    }

    Ok(created)
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for constructing the server runtime.
#[derive(Default)]
pub struct RuntimeBuilder {
    config_path: Option<PathBuf>,
    config: Option<TenderConfig>,
    port: Option<u16>,
    in_memory: bool,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration directly.
    pub fn config(mut self, config: TenderConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the listen port.
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Forces in-memory storage.
    pub fn in_memory(mut self, enabled: bool) -> Self {
        self.in_memory = enabled;
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> BinResult<ServerRuntime> {
        let mut config = match self.config {
            Some(cfg) => cfg,
            None => {
                let path = self
                    .config_path
                    .ok_or_else(|| BinError::config("No configuration provided"))?;

                load_config(&path).map_err(|e| {
                    BinError::from(e).with_context(format!("loading {}", path.display()))
                })?
            }
        };

        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.in_memory {
            config.storage.backend = StorageBackend::Memory;
        }

        Ok(ServerRuntime::new(config))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tender_config::{BootstrapUser, SecretValue};
    use tender_core::Role;

    fn test_config() -> TenderConfig {
        let mut config = TenderConfig::default();
        config.security.jwt.secret = Some(SecretValue::new(
            "runtime-test-secret-that-is-long-enough",
        ));
        config.storage.backend = StorageBackend::Memory;
        config
    }

    fn bootstrap_user(name: &str, roles: &[&str]) -> BootstrapUser {
        BootstrapUser {
            user_name: name.to_string(),
            email: format!("{name}@example.org"),
            password: SecretValue::new("bootstrap-password"),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_runtime_builder_overrides() {
        let runtime = RuntimeBuilder::new()
            .config(test_config())
            .port(Some(9191))
            .in_memory(true)
            .build()
            .unwrap();

        assert_eq!(runtime.config().server.port, 9191);
        assert_eq!(runtime.config().storage.backend, StorageBackend::Memory);
        assert!(!runtime.shutdown().is_shutdown_initiated());
    }

    #[test]
    fn test_runtime_builder_requires_config() {
        assert!(RuntimeBuilder::new().build().is_err());

        let err = RuntimeBuilder::new()
            .config_path("/nonexistent/tender.yaml")
            .build()
            .err()
            .unwrap();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_api_config_from() {
        let mut config = test_config();
        config.server.port = 9000;
        config.security.signup_enabled = false;
        config.security.jwt.expiration_secs = 3600;

        let api = api_config_from(&config).unwrap();
        assert_eq!(api.port, 9000);
        assert!(!api.signup_enabled);
        assert_eq!(api.jwt.expiration_secs, 3600);
        assert_eq!(api.jwt.issuer, "tender");
        assert!(api.cors.allows_any_origin());

        config.server.cors.allowed_origins = vec!["https://example.org".into()];
        let api = api_config_from(&config).unwrap();
        assert!(!api.cors.allows_any_origin());

        config.security.jwt.secret = None;
        assert!(api_config_from(&config).is_err());
    }

    #[test]
    fn test_open_sqlite_storage_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.storage.backend = StorageBackend::Sqlite;
        config.storage.path = dir.path().join("nested").join("tender.db");

        let storage = open_storage(&config).unwrap();
        assert_eq!(storage.repository.backend_name(), "sqlite");
        assert!(dir.path().join("nested").exists());
    }

    #[tokio::test]
    async fn test_sqlite_accounts_persist_across_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.storage.backend = StorageBackend::Sqlite;
        config.storage.path = dir.path().join("tender.db");
        config.bootstrap.users = vec![bootstrap_user("admin", &["ROLE_ADMIN"])];

        {
            let storage = open_storage(&config).unwrap();
            let created = bootstrap_users(storage.users.as_ref(), &config.bootstrap)
                .await
                .unwrap();
            assert_eq!(created, 1);
            let signup = UserAccount::new("dana", "dana@example.org", "hash", vec![Role::User]);
            storage.users.insert(signup).await.unwrap();
        }

        let storage = open_storage(&config).unwrap();
        let created = bootstrap_users(storage.users.as_ref(), &config.bootstrap)
            .await
            .unwrap();
        assert_eq!(created, 0);

        let names: Vec<_> = storage
            .users
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.user_name)
            .collect();
        assert_eq!(names, vec!["admin", "dana"]);
    }

    #[tokio::test]
    async fn test_bootstrap_users_is_idempotent() {
        let users = MemoryUserRepository::new();
        let bootstrap = BootstrapConfig {
            users: vec![
                bootstrap_user("admin", &["ROLE_ADMIN"]),
                bootstrap_user("plain", &[]),
            ],
        };

        assert_eq!(bootstrap_users(&users, &bootstrap).await.unwrap(), 2);
        assert_eq!(bootstrap_users(&users, &bootstrap).await.unwrap(), 0);

        let admin = users.find_by_name("admin").await.unwrap().unwrap();
        assert_eq!(admin.roles, vec![Role::Admin]);
        assert!(tender_api::auth::verify_password(
            "bootstrap-password",
            &admin.password_hash
        ));

        let plain = users.find_by_name("plain").await.unwrap().unwrap();
        assert_eq!(plain.roles, vec![Role::User]);
    }

    #[tokio::test]
    async fn test_purge_task_stops_on_shutdown() {
        let codes = Arc::new(LoginCodeStore::new(Duration::from_secs(60)));
        let shutdown = ShutdownCoordinator::new();
        let task = tokio::spawn(purge_login_codes(codes, shutdown.subscribe()));

        shutdown.initiate_shutdown();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("purge task should stop")
            .unwrap();
    }
}
