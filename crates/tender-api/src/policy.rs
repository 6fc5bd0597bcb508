// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Path-based access policy.
//!
//! An [`AccessPolicy`] is plain data: an ordered list of rules mapping a path
//! pattern (and optionally a method) to a [`Requirement`]. The first matching
//! rule decides; requests matching no rule fall back to the default
//! requirement.
//!
//! Rules are kept most-specific-first no matter the order they were added in:
//! exact paths before wildcards, longer literal prefixes before shorter ones,
//! method-bound rules before method-agnostic ones, insertion order for ties.
//!
//! # Patterns
//!
//! | pattern   | matches                                   |
//! |-----------|-------------------------------------------|
//! | `/health` | exactly `/health`                         |
//! | `/a/*`    | `/a/x`, not `/a` and not `/a/x/y`         |
//! | `/a/**`   | `/a`, `/a/x`, `/a/x/y`                    |
//!
//! # Example
//!
//! ```
//! use axum::http::Method;
//! use tender_api::{AccessPolicy, AuthContext, Decision};
//!
//! let policy = AccessPolicy::canonical();
//! let anonymous = AuthContext::anonymous();
//!
//! assert_eq!(policy.decide(&Method::GET, "/health", &anonymous), Decision::Allow);
//! assert_eq!(
//!     policy.decide(&Method::GET, "/api/v1/procurements", &anonymous),
//!     Decision::Unauthenticated
//! );
//! ```

use std::cmp::Reverse;
use std::fmt;

use axum::http::Method;
use tender_core::Role;

use crate::auth::AuthContext;

// =============================================================================
// PathPattern
// =============================================================================

/// A path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// Matches one path exactly.
    Exact(String),
    /// Matches one extra segment below the prefix (`/prefix/*`).
    Segment(String),
    /// Matches the prefix itself and everything below it (`/prefix/**`).
    Subtree(String),
}

impl PathPattern {
    /// Parses a pattern string.
    pub fn parse(pattern: &str) -> Self {
        if let Some(prefix) = pattern.strip_suffix("/**") {
            Self::Subtree(prefix.to_string())
        } else if let Some(prefix) = pattern.strip_suffix("/*") {
            Self::Segment(prefix.to_string())
        } else {
            Self::Exact(normalize(pattern).to_string())
        }
    }

    /// Returns `true` if the path matches.
    pub fn matches(&self, path: &str) -> bool {
        let path = normalize(path);
        match self {
            Self::Exact(exact) => path == exact,
            Self::Segment(prefix) => path
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .is_some_and(|rest| !rest.is_empty() && !rest.contains('/')),
            Self::Subtree(prefix) => {
                prefix.is_empty()
                    || path == prefix
                    || path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        }
    }

    /// Returns `true` for wildcard patterns.
    pub fn is_wildcard(&self) -> bool {
        !matches!(self, Self::Exact(_))
    }

    fn literal(&self) -> &str {
        match self {
            Self::Exact(s) | Self::Segment(s) | Self::Subtree(s) => s,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Exact(_) => 0,
            Self::Segment(_) => 1,
            Self::Subtree(_) => 2,
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(s) => write!(f, "{s}"),
            Self::Segment(s) => write!(f, "{s}/*"),
            Self::Subtree(s) => write!(f, "{s}/**"),
        }
    }
}

impl From<&str> for PathPattern {
    fn from(pattern: &str) -> Self {
        Self::parse(pattern)
    }
}

/// Strips a trailing slash, keeping the root path intact.
fn normalize(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

// =============================================================================
// Requirement & Decision
// =============================================================================

/// What a request must carry to pass a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Anyone, including anonymous callers.
    Permit,
    /// Any valid token.
    Authenticated,
    /// A valid token holding at least one of the roles.
    AnyRole(Vec<Role>),
    /// A valid token holding the role.
    Role(Role),
}

impl Requirement {
    /// Evaluates the requirement against a request context.
    pub fn evaluate(&self, ctx: &AuthContext) -> Decision {
        match self {
            Self::Permit => Decision::Allow,
            _ if ctx.is_anonymous() => Decision::Unauthenticated,
            Self::Authenticated => Decision::Allow,
            Self::AnyRole(roles) if ctx.has_any_role(roles) => Decision::Allow,
            Self::Role(role) if ctx.has_role(*role) => Decision::Allow,
            Self::AnyRole(_) | Self::Role(_) => Decision::Forbidden,
        }
    }
}

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request may proceed.
    Allow,
    /// The request needs a valid token (401).
    Unauthenticated,
    /// The caller is known but lacks a role (403).
    Forbidden,
}

// =============================================================================
// AccessRule & AccessPolicy
// =============================================================================

/// A single policy rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    /// Path pattern.
    pub pattern: PathPattern,
    /// Method restriction, `None` for every method.
    pub method: Option<Method>,
    /// What matching requests need.
    pub requirement: Requirement,
}

impl AccessRule {
    /// Returns `true` if the rule applies to the request.
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().is_none_or(|m| m == method) && self.pattern.matches(path)
    }
}

/// Ordered access rules plus a fallback requirement.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
    default: Requirement,
}

impl AccessPolicy {
    /// Creates a policy builder. The default requirement is `Authenticated`.
    pub fn builder() -> AccessPolicyBuilder {
        AccessPolicyBuilder::default()
    }

    /// The rule table served by Tender.
    pub fn canonical() -> Self {
        let integrations = vec![Role::Admin, Role::ChromeExtension];

        Self::builder()
            .permit("/")
            .permit("/health")
            .permit("/v1/auth/login")
            .permit("/v1/auth/signup")
            .permit("/v1/auth/code/**")
            .rule("/api/v1/management/**", Requirement::AnyRole(integrations.clone()))
            .rule("/v1/chrome/**", Requirement::AnyRole(integrations))
            .rule("/v1/auth/test/**", Requirement::Role(Role::ChromeExtension))
            .default_requirement(Requirement::Authenticated)
            .build()
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }

    /// Returns the requirement that applies to a request.
    pub fn requirement_for(&self, method: &Method, path: &str) -> &Requirement {
        self.rules
            .iter()
            .find(|rule| rule.matches(method, path))
            .map(|rule| &rule.requirement)
            .unwrap_or(&self.default)
    }

    /// Decides a request.
    pub fn decide(&self, method: &Method, path: &str, ctx: &AuthContext) -> Decision {
        self.requirement_for(method, path).evaluate(ctx)
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::canonical()
    }
}

/// Builder for [`AccessPolicy`].
#[derive(Debug)]
pub struct AccessPolicyBuilder {
    rules: Vec<AccessRule>,
    default: Requirement,
}

impl Default for AccessPolicyBuilder {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            default: Requirement::Authenticated,
        }
    }
}

impl AccessPolicyBuilder {
    /// Adds a rule for every method.
    pub fn rule(mut self, pattern: &str, requirement: Requirement) -> Self {
        self.rules.push(AccessRule {
            pattern: PathPattern::parse(pattern),
            method: None,
            requirement,
        });
        self
    }

    /// Adds a rule bound to one method.
    pub fn rule_for(mut self, method: Method, pattern: &str, requirement: Requirement) -> Self {
        self.rules.push(AccessRule {
            pattern: PathPattern::parse(pattern),
            method: Some(method),
            requirement,
        });
        self
    }

    /// Adds a public rule.
    pub fn permit(self, pattern: &str) -> Self {
        self.rule(pattern, Requirement::Permit)
    }

    /// Sets the requirement for requests no rule matches.
    pub fn default_requirement(mut self, requirement: Requirement) -> Self {
        self.default = requirement;
        self
    }

    /// Orders the rules most-specific-first and builds the policy.
    pub fn build(mut self) -> AccessPolicy {
        // sort_by_key is stable, so ties keep insertion order
        self.rules.sort_by_key(|rule| {
            (
                rule.pattern.is_wildcard(),
                Reverse(rule.pattern.literal().len()),
                rule.pattern.rank(),
                rule.method.is_none(),
            )
        });

        AccessPolicy {
            rules: self.rules,
            default: self.default,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Claims;

    fn ctx(roles: &[Role]) -> AuthContext {
        AuthContext::from_claims(&Claims::new("tester", roles, 60))
    }

    #[test]
    fn test_pattern_matching() {
        let exact = PathPattern::parse("/health");
        assert!(exact.matches("/health"));
        assert!(exact.matches("/health/"));
        assert!(!exact.matches("/health/deep"));

        let segment = PathPattern::parse("/a/*");
        assert!(segment.matches("/a/x"));
        assert!(!segment.matches("/a"));
        assert!(!segment.matches("/a/x/y"));
        assert!(!segment.matches("/ab/x"));

        let subtree = PathPattern::parse("/a/**");
        assert!(subtree.matches("/a"));
        assert!(subtree.matches("/a/x"));
        assert!(subtree.matches("/a/x/y"));
        assert!(!subtree.matches("/ab"));

        assert!(PathPattern::parse("/**").matches("/anything/at/all"));
        assert!(PathPattern::parse("/").matches("/"));
        assert!(!PathPattern::parse("/").matches("/x"));
    }

    #[test]
    fn test_pattern_display() {
        for raw in ["/health", "/a/*", "/a/**"] {
            assert_eq!(PathPattern::parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn test_most_specific_rule_wins_regardless_of_order() {
        let policy = AccessPolicy::builder()
            .permit("/api/**")
            .rule("/api/admin/**", Requirement::Role(Role::Admin))
            .rule("/api/admin/status", Requirement::Authenticated)
            .build();

        let user = ctx(&[Role::User]);
        assert_eq!(policy.decide(&Method::GET, "/api/things", &user), Decision::Allow);
        assert_eq!(
            policy.decide(&Method::GET, "/api/admin/users", &user),
            Decision::Forbidden
        );
        assert_eq!(
            policy.decide(&Method::GET, "/api/admin/status", &user),
            Decision::Allow
        );

        let patterns: Vec<String> = policy.rules().iter().map(|r| r.pattern.to_string()).collect();
        assert_eq!(patterns, vec!["/api/admin/status", "/api/admin/**", "/api/**"]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let policy = AccessPolicy::builder()
            .rule("/x/**", Requirement::Role(Role::Email))
            .rule("/y/**", Requirement::Role(Role::Telegram))
            .build();

        assert_eq!(policy.rules()[0].pattern.to_string(), "/x/**");
        assert_eq!(policy.rules()[1].pattern.to_string(), "/y/**");
    }

    #[test]
    fn test_method_bound_rule_precedes_generic() {
        let policy = AccessPolicy::builder()
            .permit("/items/**")
            .rule_for(Method::DELETE, "/items/**", Requirement::Role(Role::Admin))
            .build();

        let user = ctx(&[Role::User]);
        assert_eq!(policy.decide(&Method::GET, "/items/1", &user), Decision::Allow);
        assert_eq!(
            policy.decide(&Method::DELETE, "/items/1", &user),
            Decision::Forbidden
        );
    }

    #[test]
    fn test_default_requirement() {
        let policy = AccessPolicy::builder().build();
        assert_eq!(
            policy.decide(&Method::GET, "/anything", &AuthContext::anonymous()),
            Decision::Unauthenticated
        );
        assert_eq!(policy.decide(&Method::GET, "/anything", &ctx(&[])), Decision::Allow);
    }

    #[test]
    fn test_canonical_public_paths() {
        let policy = AccessPolicy::canonical();
        let anon = AuthContext::anonymous();

        for path in ["/", "/health", "/v1/auth/login", "/v1/auth/signup", "/v1/auth/code/abc"] {
            assert_eq!(policy.decide(&Method::GET, path, &anon), Decision::Allow, "{path}");
        }
        assert_eq!(
            policy.decide(&Method::GET, "/v1/auth/me", &anon),
            Decision::Unauthenticated
        );
    }

    #[test]
    fn test_canonical_role_rules() {
        let policy = AccessPolicy::canonical();
        let user = ctx(&[Role::User]);
        let admin = ctx(&[Role::Admin]);
        let chrome = ctx(&[Role::ChromeExtension]);

        let management = "/api/v1/management/users";
        assert_eq!(policy.decide(&Method::GET, management, &user), Decision::Forbidden);
        assert_eq!(policy.decide(&Method::GET, management, &admin), Decision::Allow);
        assert_eq!(policy.decide(&Method::GET, management, &chrome), Decision::Allow);

        let chrome_api = "/v1/chrome/procurements";
        assert_eq!(policy.decide(&Method::POST, chrome_api, &user), Decision::Forbidden);
        assert_eq!(policy.decide(&Method::POST, chrome_api, &chrome), Decision::Allow);

        let test_jwt = "/v1/auth/test/jwt";
        assert_eq!(policy.decide(&Method::GET, test_jwt, &admin), Decision::Forbidden);
        assert_eq!(policy.decide(&Method::GET, test_jwt, &chrome), Decision::Allow);
        assert_eq!(
            policy.decide(&Method::GET, test_jwt, &AuthContext::anonymous()),
            Decision::Unauthenticated
        );

        assert_eq!(
            policy.decide(&Method::GET, "/api/v1/procurements", &user),
            Decision::Allow
        );
    }
}
