// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication context.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use tender_core::Role;
use uuid::Uuid;

use super::Claims;

const ANONYMOUS_USER: &str = "anonymous";

/// Authentication context for a request.
///
/// Every request passing the authentication layer carries exactly one of
/// these in its extensions, either resolved from a valid token or
/// anonymous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// User name from the token subject.
    pub user_id: String,
    /// Known roles granted by the token.
    pub roles: Vec<Role>,
    /// Whether the context came from a valid token.
    pub authenticated: bool,
    /// Client IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<IpAddr>,
    /// Request ID for tracing.
    pub request_id: Uuid,
}

impl AuthContext {
    /// Creates an authenticated context from validated claims.
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            roles: claims.known_roles(),
            authenticated: true,
            client_ip: None,
            request_id: Uuid::now_v7(),
        }
    }

    /// Creates an anonymous context (for unauthenticated requests).
    pub fn anonymous() -> Self {
        Self {
            user_id: ANONYMOUS_USER.to_string(),
            roles: Vec::new(),
            authenticated: false,
            client_ip: None,
            request_id: Uuid::now_v7(),
        }
    }

    /// Sets the client IP address.
    pub fn with_client_ip(mut self, ip: Option<IpAddr>) -> Self {
        self.client_ip = ip;
        self
    }

    /// Sets the request ID.
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    /// Returns `true` if the context has the given role.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Returns `true` if the context has any of the given roles.
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.has_role(*role))
    }

    /// Returns `true` if this is an anonymous context.
    pub fn is_anonymous(&self) -> bool {
        !self.authenticated
    }

    /// Returns `true` if this context has admin privileges.
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_context_from_claims() {
        let claims = Claims::builder("alice")
            .role(Role::Admin)
            .raw_role("ROLE_ROOT")
            .build();

        let ctx = AuthContext::from_claims(&claims);

        assert_eq!(ctx.user_id, "alice");
        assert!(!ctx.is_anonymous());
        assert!(ctx.is_admin());
        assert_eq!(ctx.roles, vec![Role::Admin]);
    }

    #[test]
    fn test_anonymous_context() {
        let ctx = AuthContext::anonymous();

        assert!(ctx.is_anonymous());
        assert!(!ctx.is_admin());
        assert!(ctx.roles.is_empty());
    }

    #[test]
    fn test_user_named_anonymous_is_authenticated() {
        let ctx = AuthContext::from_claims(&Claims::new("anonymous", &[Role::User], 60));
        assert!(!ctx.is_anonymous());
    }

    #[test]
    fn test_has_any_role() {
        let ctx = AuthContext::from_claims(&Claims::new("bob", &[Role::User, Role::Email], 60));

        assert!(ctx.has_any_role(&[Role::Admin, Role::Email]));
        assert!(!ctx.has_any_role(&[Role::Admin, Role::ChromeExtension]));
    }
}
