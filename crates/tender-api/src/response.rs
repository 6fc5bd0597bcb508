// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tender_core::{Role, UserAccount, UserStatus};

// =============================================================================
// Service responses
// =============================================================================

/// Index page response.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexResponse {
    /// Service name.
    pub service: String,
    /// Version string.
    pub version: String,
}

impl IndexResponse {
    /// Describes this service.
    pub fn current() -> Self {
        Self {
            service: "tender".to_string(),
            version: crate::VERSION.to_string(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status, `ok` or `degraded`.
    pub status: String,
    /// Version string.
    pub version: String,
    /// Component statuses.
    pub components: Vec<ComponentStatus>,
}

/// Status of a system component.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentStatus {
    /// Component name.
    pub name: String,
    /// Whether the component is healthy.
    pub healthy: bool,
    /// Optional message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// =============================================================================
// Auth responses
// =============================================================================

/// Authentication response.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Access token.
    pub token: String,
    /// Token type (always "Bearer").
    pub token_type: String,
    /// Expires in seconds.
    pub expires_in: i64,
    /// Signed-in user.
    pub user_name: String,
    /// Roles carried by the token.
    pub roles: Vec<Role>,
}

impl AuthResponse {
    /// Creates a new auth response.
    pub fn new(token: String, expires_in: i64, user_name: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            token,
            token_type: "Bearer".to_string(),
            expires_in,
            user_name: user_name.into(),
            roles,
        }
    }
}

/// Current principal.
#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    /// User name.
    pub user_name: String,
    /// Granted roles.
    pub roles: Vec<Role>,
}

/// A user account as shown to administrators.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    /// Storage id.
    pub id: Option<i64>,
    /// Login name.
    pub user_name: String,
    /// Contact email.
    pub email: String,
    /// Granted roles.
    pub roles: Vec<Role>,
    /// Lifecycle state.
    pub status: UserStatus,
    /// Registration instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<UserAccount> for UserResponse {
    fn from(account: UserAccount) -> Self {
        Self {
            id: account.id.map(|id| id.get()),
            user_name: account.user_name,
            email: account.email,
            roles: account.roles,
            status: account.status,
            created_at: account.created_at,
        }
    }
}

/// A freshly issued one-time login code.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginCodeResponse {
    /// The code.
    pub code: String,
    /// The account it signs in as.
    pub user_name: String,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
}

/// Plain confirmation message.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message text.
    pub message: String,
}

impl MessageResponse {
    /// Creates a message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_response_hides_hash() {
        let account = UserAccount::new("alice", "a@example.org", "$argon2id$secret", vec![Role::User]);
        let json = serde_json::to_value(UserResponse::from(account)).unwrap();

        assert_eq!(json["user_name"], "alice");
        assert_eq!(json["roles"], serde_json::json!(["ROLE_USER"]));
        assert_eq!(json["status"], "active");
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_auth_response() {
        let response = AuthResponse::new("t".into(), 60, "bob", vec![Role::Admin]);
        assert_eq!(response.token_type, "Bearer");
    }
}
