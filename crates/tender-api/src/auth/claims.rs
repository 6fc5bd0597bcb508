// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! JWT claims structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tender_core::Role;
use uuid::Uuid;

/// Default lifetime for tokens built without an explicit expiry.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// JWT claims carried by every Tender token.
///
/// Roles travel as their wire names (`ROLE_ADMIN`, ...). Names that do not
/// match a known role are kept here but ignored when the request context is
/// built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the user name.
    pub sub: String,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at time (Unix timestamp).
    pub iat: i64,

    /// Not before time (Unix timestamp).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Issuer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// JWT ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Granted role names.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Claims {
    /// Creates claims for a user valid for `expires_in_secs` from now.
    pub fn new(user_name: impl Into<String>, roles: &[Role], expires_in_secs: i64) -> Self {
        let now = Utc::now().timestamp();

        Self {
            sub: user_name.into(),
            exp: now + expires_in_secs,
            iat: now,
            nbf: Some(now),
            iss: None,
            jti: Some(Uuid::now_v7().to_string()),
            roles: roles.iter().map(|role| role.as_str().to_string()).collect(),
        }
    }

    /// Creates a builder for constructing claims.
    pub fn builder(user_name: impl Into<String>) -> ClaimsBuilder {
        ClaimsBuilder::new(user_name)
    }

    /// Returns the user name.
    pub fn user_name(&self) -> &str {
        &self.sub
    }

    /// Returns the known roles, dropping unrecognised names.
    pub fn known_roles(&self) -> Vec<Role> {
        Role::parse_all(self.roles.iter().map(String::as_str))
    }

    /// Returns `true` if the claims name the given role.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| r == role.as_str())
    }

    /// Returns `true` if the token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Returns the expiration time as a DateTime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }
}

// =============================================================================
// Claims Builder
// =============================================================================

/// Builder for constructing JWT claims.
#[derive(Debug)]
pub struct ClaimsBuilder {
    user_name: String,
    roles: Vec<String>,
    expires_in_secs: i64,
    issuer: Option<String>,
}

impl ClaimsBuilder {
    /// Creates a new builder.
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            roles: Vec::new(),
            expires_in_secs: DEFAULT_EXPIRES_IN_SECS,
            issuer: None,
        }
    }

    /// Adds a role.
    pub fn role(mut self, role: Role) -> Self {
        self.roles.push(role.as_str().to_string());
        self
    }

    /// Adds a raw role name, known or not.
    pub fn raw_role(mut self, name: impl Into<String>) -> Self {
        self.roles.push(name.into());
        self
    }

    /// Sets the expiration time in seconds. Negative values build expired claims.
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.expires_in_secs = seconds;
        self
    }

    /// Sets the issuer.
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Builds the claims.
    pub fn build(self) -> Claims {
        let mut claims = Claims::new(self.user_name, &[], self.expires_in_secs);
        claims.roles = self.roles;
        claims.iss = self.issuer;
        claims
    }
}

// =============================================================================
// Tests
// =============================================================================
