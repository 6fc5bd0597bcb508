// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User repositories.
//!
//! [`MemoryUserRepository`] keeps accounts for the life of the process.
//! [`SqliteUserRepository`] stores them in the `users` table next to the
//! procurements, so accounts survive restarts.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row};
use tracing::info;

use tender_core::error::{StoreError, StoreResult};
use tender_core::{Role, UserAccount, UserId, UserRepository, UserStatus};

use crate::sqlite::SqliteRepository;

fn name_taken(user_name: &str) -> StoreError {
    StoreError::constraint(format!("user name '{user_name}' is already taken"))
}

// =============================================================================
// MemoryUserRepository
// =============================================================================

/// A thread-safe in-memory [`UserRepository`].
///
/// Accounts are keyed by login name; ids come from a monotonic sequence.
#[derive(Debug)]
pub struct MemoryUserRepository {
    accounts: RwLock<BTreeMap<String, UserAccount>>,
    next_id: AtomicI64,
}

impl Default for MemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryUserRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, mut account: UserAccount) -> StoreResult<UserAccount> {
        let mut accounts = self.accounts.write();
        if accounts.contains_key(&account.user_name) {
            return Err(name_taken(&account.user_name));
        }

        account.id = Some(UserId::new(self.next_id.fetch_add(1, Ordering::SeqCst)));
        account.created_at.get_or_insert_with(Utc::now);
        accounts.insert(account.user_name.clone(), account.clone());

        info!(user = %account.user_name, roles = ?account.roles, "User registered");
        Ok(account)
    }

    async fn find_by_name(&self, user_name: &str) -> StoreResult<Option<UserAccount>> {
        Ok(self.accounts.read().get(user_name).cloned())
    }

    async fn list_all(&self) -> StoreResult<Vec<UserAccount>> {
        let mut accounts: Vec<UserAccount> = self.accounts.read().values().cloned().collect();
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }

    async fn set_status(&self, user_name: &str, status: UserStatus) -> StoreResult<bool> {
        match self.accounts.write().get_mut(user_name) {
            Some(account) => {
                account.status = status;
                info!(user = %user_name, ?status, "User status changed");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// =============================================================================
// SqliteUserRepository
// =============================================================================

const USER_COLUMNS: &str = "id, user_name, email, password_hash, roles, status, created_at_us";

/// A [`UserRepository`] over the database of a [`SqliteRepository`].
///
/// Obtained from [`SqliteRepository::users`]; both share one connection.
/// Roles are stored as a comma-separated list of their `ROLE_*` names.
#[derive(Debug, Clone)]
pub struct SqliteUserRepository {
    store: SqliteRepository,
}

impl SqliteUserRepository {
    pub(crate) fn new(store: SqliteRepository) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn insert(&self, mut account: UserAccount) -> StoreResult<UserAccount> {
        let created_at = account.created_at.unwrap_or_else(Utc::now);
        let created_us = created_at.timestamp_micros();
        let row = (
            account.user_name.clone(),
            account.email.clone(),
            account.password_hash.clone(),
            encode_roles(&account.roles),
            account.status.as_str(),
        );

        let id = self
            .store
            .with_conn("insert_user", move |conn| {
                conn.execute(
                    "INSERT INTO users (user_name, email, password_hash, roles, status, created_at_us) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![row.0, row.1, row.2, row.3, row.4, created_us],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(|e| {
                if e.is_constraint() {
                    name_taken(&account.user_name)
                } else {
                    e
                }
            })?;

        account.id = Some(UserId::new(id));
        account.created_at = DateTime::from_timestamp_micros(created_us);

        info!(user = %account.user_name, roles = ?account.roles, "User registered");
        Ok(account)
    }

    async fn find_by_name(&self, user_name: &str) -> StoreResult<Option<UserAccount>> {
        let user_name = user_name.to_string();
        self.store
            .with_conn("find_user", move |conn| {
                conn.query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE user_name = ?1"),
                    [user_name],
                    decode_user,
                )
                .optional()
            })
            .await
    }

    async fn list_all(&self) -> StoreResult<Vec<UserAccount>> {
        self.store
            .with_conn("list_users", |conn| {
                let mut stmt =
                    conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
                let rows = stmt.query_map([], decode_user)?;
                rows.collect()
            })
            .await
    }

    async fn set_status(&self, user_name: &str, status: UserStatus) -> StoreResult<bool> {
        let name = user_name.to_string();
        let changed = self
            .store
            .with_conn("set_user_status", move |conn| {
                conn.execute(
                    "UPDATE users SET status = ?1 WHERE user_name = ?2",
                    rusqlite::params![status.as_str(), name],
                )
            })
            .await?;

        if changed > 0 {
            info!(user = %user_name, ?status, "User status changed");
        }
        Ok(changed > 0)
    }
}

fn encode_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

fn decode_user(row: &Row<'_>) -> rusqlite::Result<UserAccount> {
    let roles: String = row.get(4)?;
    let status: String = row.get(5)?;
    let status = UserStatus::parse(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            Type::Text,
            format!("unknown user status '{status}'").into(),
        )
    })?;

    Ok(UserAccount {
        id: Some(UserId::new(row.get(0)?)),
        user_name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        roles: Role::parse_all(roles.split(',').filter(|r| !r.is_empty())),
        status,
        created_at: row
            .get::<_, Option<i64>>(6)?
            .and_then(DateTime::from_timestamp_micros),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tender_core::UserCheck;

    fn account(name: &str) -> UserAccount {
        UserAccount::new(name, format!("{name}@example.com"), "hash", vec![Role::User])
    }

    #[tokio::test]
    async fn test_duplicate_name_is_constraint_error() {
        let repo = MemoryUserRepository::new();
        repo.insert(account("alice")).await.unwrap();

        let err = repo.insert(account("alice")).await.unwrap_err();
        assert!(err.is_constraint());
    }

    #[tokio::test]
    async fn test_list_in_registration_order() {
        let repo = MemoryUserRepository::new();
        for name in ["zed", "amy", "kim"] {
            repo.insert(account(name)).await.unwrap();
        }
        let names: Vec<_> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.user_name)
            .collect();
        assert_eq!(names, vec!["zed", "amy", "kim"]);
    }

    #[tokio::test]
    async fn test_ban_changes_check() {
        let repo = MemoryUserRepository::new();
        repo.insert(account("bob")).await.unwrap();

        assert!(repo.set_status("bob", UserStatus::Banned).await.unwrap());
        assert!(!repo.set_status("nobody", UserStatus::Banned).await.unwrap());

        let bob = repo.find_by_name("bob").await.unwrap().unwrap();
        assert_eq!(bob.check(), UserCheck::Incorrected);
    }

    #[tokio::test]
    async fn test_sqlite_accounts_round_trip() {
        let repo = SqliteRepository::memory().unwrap().users();
        let mut admin = account("root");
        admin.roles = vec![Role::User, Role::Admin];
        let saved = repo.insert(admin).await.unwrap();
        assert!(saved.id.is_some());

        let loaded = repo.find_by_name("root").await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert!(loaded.has_role(Role::Admin));
        assert!(repo.find_by_name("nobody").await.unwrap().is_none());

        let err = repo.insert(account("root")).await.unwrap_err();
        assert!(err.is_constraint());
        assert!(err.to_string().contains("'root'"));
    }

    #[tokio::test]
    async fn test_sqlite_status_and_listing() {
        let repo = SqliteRepository::memory().unwrap().users();
        for name in ["zed", "amy"] {
            repo.insert(account(name)).await.unwrap();
        }

        assert!(repo.set_status("amy", UserStatus::Disabled).await.unwrap());
        assert!(!repo.set_status("ghost", UserStatus::Banned).await.unwrap());

        let all = repo.list_all().await.unwrap();
        let names: Vec<_> = all.iter().map(|a| a.user_name.as_str()).collect();
        assert_eq!(names, vec!["zed", "amy"]);
        assert_eq!(all[1].check(), UserCheck::Incorrected);
    }

    #[tokio::test]
    async fn test_sqlite_accounts_survive_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tender.db");

        {
            let store = SqliteRepository::open(&path).unwrap();
            store.users().insert(account("carol")).await.unwrap();
            store.users().set_status("carol", UserStatus::Banned).await.unwrap();
        }

        let users = SqliteRepository::open(&path).unwrap().users();
        let carol = users.find_by_name("carol").await.unwrap().unwrap();
        assert_eq!(carol.status, UserStatus::Banned);
        assert_eq!(carol.password_hash, "hash");
        assert_eq!(carol.roles, vec![Role::User]);
    }
}
