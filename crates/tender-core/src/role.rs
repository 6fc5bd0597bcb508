// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The fixed set of user roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A role granted to a user.
///
/// Roles travel in tokens as their `ROLE_*` names and are compared
/// case-sensitively.
///
/// # Examples
///
/// ```
/// use tender_core::Role;
///
/// assert_eq!(Role::parse("ROLE_ADMIN"), Some(Role::Admin));
/// assert_eq!(Role::parse("role_admin"), None);
/// assert_eq!(Role::ChromeExtension.as_str(), "ROLE_CHROME_EXTENSION");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Regular user.
    #[serde(rename = "ROLE_USER")]
    User,
    /// Administrator.
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
    /// Telegram bot integration.
    #[serde(rename = "ROLE_TELEGRAM")]
    Telegram,
    /// Browser extension integration.
    #[serde(rename = "ROLE_CHROME_EXTENSION")]
    ChromeExtension,
    /// Email notification integration.
    #[serde(rename = "ROLE_EMAIL")]
    Email,
}

impl Role {
    /// All roles in declaration order.
    pub const ALL: [Role; 5] = [
        Role::User,
        Role::Admin,
        Role::Telegram,
        Role::ChromeExtension,
        Role::Email,
    ];

    /// Returns the wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Admin => "ROLE_ADMIN",
            Role::Telegram => "ROLE_TELEGRAM",
            Role::ChromeExtension => "ROLE_CHROME_EXTENSION",
            Role::Email => "ROLE_EMAIL",
        }
    }

    /// Parses a wire name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == name)
    }

    /// Parses a list of wire names, dropping unknown entries.
    pub fn parse_all<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<Self> {
        let mut roles: Vec<Self> = names.into_iter().filter_map(Self::parse).collect();
        roles.sort();
        roles.dedup();
        roles
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_every_role() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert_eq!(Role::parse("ROLE_chrome_extension"), None);
        assert_eq!(Role::parse("ADMIN"), None);
        assert!("role_user".parse::<Role>().is_err());
    }

    #[test]
    fn test_parse_all_drops_unknown() {
        let roles = Role::parse_all(["ROLE_ADMIN", "ROLE_ROOT", "ROLE_ADMIN", "ROLE_USER"]);
        assert_eq!(roles, vec![Role::User, Role::Admin]);
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&Role::ChromeExtension).unwrap();
        assert_eq!(json, "\"ROLE_CHROME_EXTENSION\"");
        let role: Role = serde_json::from_str("\"ROLE_EMAIL\"").unwrap();
        assert_eq!(role, Role::Email);
    }
}
