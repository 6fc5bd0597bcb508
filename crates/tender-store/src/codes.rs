// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Single-use sign-in codes.
//!
//! An administrator issues a code for a user; the browser extension trades it
//! for a token on a public endpoint. A code can be redeemed once and only
//! until it expires.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::debug;

/// Default code lifetime.
pub const DEFAULT_CODE_TTL: Duration = Duration::from_secs(10 * 60);

/// Length of generated codes.
pub const CODE_LENGTH: usize = 24;

#[derive(Debug, Clone)]
struct PendingCode {
    user_name: String,
    expires_at: Instant,
}

/// A freshly issued code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    /// The code to hand to the user.
    pub code: String,
    /// The account the code signs in as.
    pub user_name: String,
    /// Wall-clock expiry.
    pub expires_at: DateTime<Utc>,
}

/// Concurrent store of pending codes.
#[derive(Debug)]
pub struct LoginCodeStore {
    codes: DashMap<String, PendingCode>,
    ttl: Duration,
}

impl Default for LoginCodeStore {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_TTL)
    }
}

impl LoginCodeStore {
    /// Creates a store whose codes live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            codes: DashMap::new(),
            ttl,
        }
    }

    /// Code lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a new code for the user.
    pub fn issue(&self, user_name: impl Into<String>) -> IssuedCode {
        let user_name = user_name.into();
        let code = generate_code();
        let expires_at = Utc::now()
            + chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero());

        self.codes.insert(
            code.clone(),
            PendingCode {
                user_name: user_name.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        debug!(user = %user_name, "Issued login code");

        IssuedCode {
            code,
            user_name,
            expires_at,
        }
    }

    /// Consumes a code and returns the user name it was issued for.
    ///
    /// Returns `None` for unknown, already used or expired codes.
    pub fn redeem(&self, code: &str) -> Option<String> {
        let (_, pending) = self.codes.remove(code)?;
        if Instant::now() >= pending.expires_at {
            debug!(user = %pending.user_name, "Rejected expired login code");
            return None;
        }
        Some(pending.user_name)
    }

    /// Drops expired codes and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.codes.len();
        self.codes.retain(|_, pending| pending.expires_at > now);
        before.saturating_sub(self.codes.len())
    }

    /// Number of pending codes.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns `true` if no codes are pending.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

fn generate_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CODE_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_single_use() {
        let store = LoginCodeStore::default();
        let issued = store.issue("extension");

        assert_eq!(issued.code.len(), CODE_LENGTH);
        assert_eq!(store.redeem(&issued.code).as_deref(), Some("extension"));
        assert_eq!(store.redeem(&issued.code), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_expired_code_is_rejected() {
        let store = LoginCodeStore::new(Duration::ZERO);
        let issued = store.issue("extension");
        assert_eq!(store.redeem(&issued.code), None);
    }

    #[test]
    fn test_purge_expired() {
        let store = LoginCodeStore::new(Duration::ZERO);
        store.issue("a");
        store.issue("b");
        assert_eq!(store.purge_expired(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_codes_are_distinct() {
        let store = LoginCodeStore::default();
        let a = store.issue("a");
        let b = store.issue("a");
        assert_ne!(a.code, b.code);
        assert_eq!(store.len(), 2);
    }
}
