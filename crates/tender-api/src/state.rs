// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use tender_core::{ProcurementDataManager, ProcurementRepository, UserRepository};
use tender_store::{LoginCodeStore, MemoryRepository, MemoryUserRepository};

use crate::auth::JwtManager;
use crate::config::ApiConfig;
use crate::policy::AccessPolicy;

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// JWT manager for token operations.
    pub jwt_manager: Arc<JwtManager>,
    /// Access policy enforced by the gate.
    pub policy: Arc<AccessPolicy>,
    /// Procurement data manager.
    pub procurements: ProcurementDataManager,
    /// User accounts.
    pub users: Arc<dyn UserRepository>,
    /// Pending one-time login codes.
    pub login_codes: Arc<LoginCodeStore>,
}

impl AppState {
    /// Creates a new app state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Returns the JWT manager.
    pub fn jwt(&self) -> &JwtManager {
        &self.jwt_manager
    }

    /// Returns the procurement data manager.
    pub fn procurements(&self) -> &ProcurementDataManager {
        &self.procurements
    }

    /// Returns the user repository.
    pub fn users(&self) -> &dyn UserRepository {
        self.users.as_ref()
    }

    /// Returns the login code store.
    pub fn login_codes(&self) -> &LoginCodeStore {
        &self.login_codes
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("jwt_manager", &self.jwt_manager)
            .field("storage", &self.procurements.repository().backend_name())
            .field("pending_codes", &self.login_codes.len())
            .finish()
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for constructing AppState.
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<ApiConfig>,
    jwt_manager: Option<Arc<JwtManager>>,
    policy: Option<Arc<AccessPolicy>>,
    repository: Option<Arc<dyn ProcurementRepository>>,
    users: Option<Arc<dyn UserRepository>>,
    login_codes: Option<Arc<LoginCodeStore>>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the JWT manager.
    pub fn jwt_manager(mut self, manager: Arc<JwtManager>) -> Self {
        self.jwt_manager = Some(manager);
        self
    }

    /// Sets the access policy.
    pub fn policy(mut self, policy: Arc<AccessPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Sets the procurement repository.
    pub fn repository(mut self, repository: Arc<dyn ProcurementRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Sets the user repository.
    pub fn users(mut self, users: Arc<dyn UserRepository>) -> Self {
        self.users = Some(users);
        self
    }

    /// Sets the login code store.
    pub fn login_codes(mut self, codes: Arc<LoginCodeStore>) -> Self {
        self.login_codes = Some(codes);
        self
    }

    /// Builds the AppState.
    ///
    /// Missing components default to the canonical policy, in-memory
    /// repositories and a code store using the configured lifetime.
    pub fn build(self) -> crate::error::ApiResult<AppState> {
        let config = self.config.unwrap_or_default();

        let jwt_manager = match self.jwt_manager {
            Some(manager) => manager,
            None => Arc::new(JwtManager::new(config.jwt.clone())?),
        };

        let policy = self
            .policy
            .unwrap_or_else(|| Arc::new(AccessPolicy::canonical()));
        let repository = self
            .repository
            .unwrap_or_else(|| Arc::new(MemoryRepository::new()));
        let users = self
            .users
            .unwrap_or_else(|| Arc::new(MemoryUserRepository::new()));
        let login_codes = self
            .login_codes
            .unwrap_or_else(|| Arc::new(LoginCodeStore::new(config.login_code_ttl())));

        Ok(AppState {
            config: Arc::new(config),
            jwt_manager,
            policy,
            procurements: ProcurementDataManager::new(repository),
            users,
            login_codes,
        })
    }
}

// =============================================================================
// FromRef implementations for extracting parts of state
// =============================================================================

impl axum::extract::FromRef<AppState> for Arc<JwtManager> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_manager.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<ApiConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl axum::extract::FromRef<AppState> for ProcurementDataManager {
    fn from_ref(state: &AppState) -> Self {
        state.procurements.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;

    fn test_config() -> ApiConfig {
        ApiConfig::default().with_jwt(JwtConfig::new("test-secret-key-that-is-long-enough-for-testing"))
    }

    #[test]
    fn test_app_state_builder_defaults() {
        let state = AppState::builder().config(test_config()).build().unwrap();

        assert_eq!(state.procurements().repository().backend_name(), "memory");
        assert!(state.login_codes().is_empty());
        assert_eq!(state.login_codes().ttl(), std::time::Duration::from_secs(600));
    }

    #[test]
    fn test_missing_secret_fails() {
        assert!(AppState::builder().build().is_err());
    }
}
