// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! JWT token management.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tender_core::Role;

use super::Claims;
use crate::error::{ApiError, ApiResult};

/// Recommended minimum secret length in bytes.
const RECOMMENDED_SECRET_LEN: usize = 32;

// =============================================================================
// JwtConfig
// =============================================================================

/// JWT configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    #[serde(skip_serializing)]
    pub secret: String,
    /// Token issuer, checked on every validation.
    pub issuer: String,
    /// Token expiration time in seconds.
    pub expiration_secs: i64,
    /// HMAC algorithm used for signing.
    #[serde(with = "algorithm_serde")]
    pub algorithm: Algorithm,
    /// Clock skew tolerance in seconds.
    pub leeway_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(), // Must be set by user
            issuer: "tender".to_string(),
            expiration_secs: 86_400,
            algorithm: Algorithm::HS256,
            leeway_secs: 30,
        }
    }
}

impl JwtConfig {
    /// Creates a new configuration with the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Sets the expiration time.
    pub fn with_expiration(mut self, duration: Duration) -> Self {
        self.expiration_secs = i64::try_from(duration.as_secs()).unwrap_or(i64::MAX);
        self
    }

    /// Sets the signing algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the clock skew tolerance.
    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ApiResult<()> {
        if self.secret.is_empty() {
            return Err(ApiError::internal("JWT secret is not configured"));
        }
        if algorithm_name(self.algorithm).is_none() {
            return Err(ApiError::internal(format!(
                "Unsupported JWT algorithm {:?}",
                self.algorithm
            )));
        }
        if self.secret.len() < RECOMMENDED_SECRET_LEN {
            tracing::warn!("JWT secret is shorter than recommended (32 bytes)");
        }
        Ok(())
    }
}

// =============================================================================
// JwtManager
// =============================================================================

/// Manager for JWT token operations.
///
/// Issues tokens for signed-in users and validates bearer tokens. Validation
/// checks the signature, the issuer, `exp` and `nbf` (within the leeway).
#[derive(Clone)]
pub struct JwtManager {
    config: Arc<JwtConfig>,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl JwtManager {
    /// Creates a new JWT manager with the given configuration.
    pub fn new(config: JwtConfig) -> ApiResult<Self> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(config.algorithm);
        validation.set_issuer(&[&config.issuer]);
        validation.leeway = config.leeway_secs;
        validation.validate_nbf = true;
        validation.validate_aud = false;

        Ok(Self {
            config: Arc::new(config),
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
        })
    }

    /// Signs the given claims.
    pub fn create_token(&self, claims: &Claims) -> ApiResult<String> {
        let header = Header::new(self.config.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| ApiError::internal(format!("Failed to create token: {}", e)))
    }

    /// Creates an access token for a user with the configured lifetime.
    pub fn create_access_token(&self, user_name: &str, roles: &[Role]) -> ApiResult<String> {
        let claims =
            Claims::new(user_name, roles, self.config.expiration_secs).with_issuer(&self.config.issuer);

        self.create_token(&claims)
    }

    /// Validates and decodes a token.
    pub fn validate_token(&self, token: &str) -> ApiResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::unauthorized("Token has expired")
                }
                jsonwebtoken::errors::ErrorKind::ImmatureSignature => {
                    ApiError::unauthorized("Token is not valid yet")
                }
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    ApiError::unauthorized("Invalid token format")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    ApiError::unauthorized("Invalid token signature")
                }
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                    ApiError::unauthorized("Invalid token issuer")
                }
                _ => ApiError::unauthorized(format!("Token validation failed: {}", e)),
            })
    }

    /// Returns the token expiration time in seconds.
    pub fn expiration_secs(&self) -> i64 {
        self.config.expiration_secs
    }

    /// Returns the configured issuer.
    pub fn issuer(&self) -> &str {
        &self.config.issuer
    }
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("issuer", &self.config.issuer)
            .field("algorithm", &self.config.algorithm)
            .field("expiration_secs", &self.config.expiration_secs)
            .finish()
    }
}

// =============================================================================
// Algorithm names
// =============================================================================

/// Maps an HMAC algorithm name to its `jsonwebtoken` value.
pub fn algorithm_from_name(name: &str) -> Option<Algorithm> {
    match name {
        "HS256" => Some(Algorithm::HS256),
        "HS384" => Some(Algorithm::HS384),
        "HS512" => Some(Algorithm::HS512),
        _ => None,
    }
}

fn algorithm_name(algorithm: Algorithm) -> Option<&'static str> {
    match algorithm {
        Algorithm::HS256 => Some("HS256"),
        Algorithm::HS384 => Some("HS384"),
        Algorithm::HS512 => Some("HS512"),
        _ => None,
    }
}

mod algorithm_serde {
    use jsonwebtoken::Algorithm;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(algorithm: &Algorithm, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        super::algorithm_name(*algorithm)
            .ok_or_else(|| serde::ser::Error::custom(format!("Unsupported algorithm: {algorithm:?}")))?
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Algorithm, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::algorithm_from_name(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("Unknown algorithm: {}", s)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-that-is-long-enough-for-testing";

    fn manager() -> JwtManager {
        JwtManager::new(JwtConfig::new(SECRET)).unwrap()
    }

    #[test]
    fn test_create_and_validate_token() {
        let manager = manager();

        let token = manager
            .create_access_token("alice", &[Role::Admin, Role::ChromeExtension])
            .unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.iss.as_deref(), Some("tender"));
        assert_eq!(claims.known_roles(), vec![Role::Admin, Role::ChromeExtension]);
    }

    #[test]
    fn test_expired_token() {
        let manager = manager();
        let claims = Claims::builder("user").issuer("tender").expires_in(-3600).build();
        let token = manager.create_token(&claims).unwrap();

        let err = manager.validate_token(&token).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn test_expiry_within_leeway_is_accepted() {
        let manager = JwtManager::new(JwtConfig::new(SECRET).with_leeway(60)).unwrap();
        let claims = Claims::builder("user").issuer("tender").expires_in(-10).build();
        let token = manager.create_token(&claims).unwrap();

        assert!(manager.validate_token(&token).is_ok());
    }

    #[test]
    fn test_invalid_token() {
        assert!(manager().validate_token("invalid.token.here").is_err());
        assert!(manager().validate_token("").is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let other = JwtManager::new(JwtConfig::new("another-secret-that-is-long-enough-too")).unwrap();
        let token = other.create_access_token("user", &[Role::User]).unwrap();

        assert!(manager().validate_token(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer() {
        let other = JwtManager::new(JwtConfig::new(SECRET).with_issuer("someone-else")).unwrap();
        let token = other.create_access_token("user", &[Role::User]).unwrap();

        let err = manager().validate_token(&token).unwrap_err();
        assert!(err.to_string().contains("issuer"));
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        assert!(JwtManager::new(JwtConfig::default()).is_err());
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!(algorithm_from_name("HS512"), Some(Algorithm::HS512));
        assert_eq!(algorithm_from_name("RS256"), None);

        let config = JwtConfig::new(SECRET).with_algorithm(Algorithm::HS384);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["algorithm"], "HS384");
        assert!(json.get("secret").is_none());
    }
}
