// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User accounts.

use std::fmt::{self, Debug};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::role::Role;

/// Storage-assigned user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Creates a new user id.
    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Normal account.
    #[default]
    Active,
    /// Blocked by an administrator.
    Banned,
    /// Temporarily switched off.
    Disabled,
    /// Soft-deleted.
    Deleted,
}

impl UserStatus {
    /// All statuses in declaration order.
    pub const ALL: [UserStatus; 4] = [
        UserStatus::Active,
        UserStatus::Banned,
        UserStatus::Disabled,
        UserStatus::Deleted,
    ];

    /// Returns the lowercase label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Banned => "banned",
            UserStatus::Disabled => "disabled",
            UserStatus::Deleted => "deleted",
        }
    }

    /// Parses a label produced by [`as_str`](Self::as_str).
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == label)
    }
}

/// Outcome of checking whether a user may sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserCheck {
    /// The account may be used.
    Corrected,
    /// The account is banned, disabled or deleted.
    Incorrected,
}

/// A registered user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    /// Storage id, `None` until persisted.
    pub id: Option<UserId>,
    /// Unique login name.
    pub user_name: String,
    /// Contact email.
    pub email: String,
    /// Argon2 PHC string.
    #[serde(default, skip_serializing)]
    pub password_hash: String,
    /// Granted roles.
    pub roles: Vec<Role>,
    /// Lifecycle state.
    pub status: UserStatus,
    /// Registration instant.
    pub created_at: Option<DateTime<Utc>>,
}

impl Debug for UserAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserAccount")
            .field("id", &self.id)
            .field("user_name", &self.user_name)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("roles", &self.roles)
            .field("status", &self.status)
            .finish()
    }
}

impl UserAccount {
    /// Creates an active, unsaved account.
    pub fn new(
        user_name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        roles: Vec<Role>,
    ) -> Self {
        Self {
            id: None,
            user_name: user_name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            roles,
            status: UserStatus::Active,
            created_at: None,
        }
    }

    /// Checks whether the account may sign in.
    pub fn check(&self) -> UserCheck {
        match self.status {
            UserStatus::Active => UserCheck::Corrected,
            UserStatus::Banned | UserStatus::Disabled | UserStatus::Deleted => {
                UserCheck::Incorrected
            }
        }
    }

    /// Returns `true` if the account holds the role.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Storage for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync + Debug {
    /// Stores a new account. Fails with a constraint error if the name is taken.
    async fn insert(&self, account: UserAccount) -> StoreResult<UserAccount>;

    /// Looks up an account by login name.
    async fn find_by_name(&self, user_name: &str) -> StoreResult<Option<UserAccount>>;

    /// Returns every account in id order.
    async fn list_all(&self) -> StoreResult<Vec<UserAccount>>;

    /// Changes an account's status. Returns `false` if the name is unknown.
    async fn set_status(&self, user_name: &str, status: UserStatus) -> StoreResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_by_status() {
        let mut account = UserAccount::new("alice", "a@example.com", "hash", vec![Role::User]);
        assert_eq!(account.check(), UserCheck::Corrected);

        for status in [UserStatus::Banned, UserStatus::Disabled, UserStatus::Deleted] {
            account.status = status;
            assert_eq!(account.check(), UserCheck::Incorrected);
        }
    }

    #[test]
    fn test_status_labels_parse_back() {
        for status in UserStatus::ALL {
            assert_eq!(UserStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(UserStatus::parse("Banned"), None);
    }

    #[test]
    fn test_hash_never_serialized_or_debugged() {
        let account = UserAccount::new("bob", "b@example.com", "$argon2id$secret", vec![]);
        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!format!("{account:?}").contains("argon2"));
    }
}
