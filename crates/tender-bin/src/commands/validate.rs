// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use serde_json::Value;
use tender_config::{StorageBackend, TenderConfig};
use tender_core::Role;

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};

/// Tokens living longer than this draw a warning.
const LONG_TOKEN_SECS: u64 = 30 * 86_400;

/// Executes the `validate` command to validate configuration.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config_path = &cli.config;

    if !config_path.exists() {
        return Err(BinError::config(format!(
            "Configuration file not found: {}",
            config_path.display()
        )));
    }

    let config = tender_config::load_config(config_path)
        .map_err(|e| BinError::from(e).with_context("Configuration validation failed"))?;
    let warnings = collect_warnings(&config);

    match args.format {
        OutputFormat::Text => {
            println!("✓ Configuration is valid: {}", config_path.display());
            println!();
            println!("Summary:");
            println!("  API: {}:{}", config.server.bind_address, config.server.port);
            println!("  Storage: {}", config.storage.backend.as_str());
            if config.storage.backend == StorageBackend::Sqlite {
                println!("  Database: {}", config.storage.path.display());
            }
            println!("  Token lifetime: {}s", config.security.jwt.expiration_secs);
            println!("  Signup: {}", if config.security.signup_enabled { "open" } else { "closed" });
            println!("  Bootstrap accounts: {}", config.bootstrap.users.len());

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ⚠ {warning}");
                }
            }

            if args.show_config {
                println!();
                println!("Parsed configuration:");
                println!("{}", pretty(&redacted(&config)));
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_path": config_path.display().to_string(),
                "summary": {
                    "bind_address": config.server.bind_address.to_string(),
                    "port": config.server.port,
                    "storage": config.storage.backend.as_str(),
                    "token_lifetime_secs": config.security.jwt.expiration_secs,
                    "signup_enabled": config.security.signup_enabled,
                    "bootstrap_accounts": config.bootstrap.users.len(),
                },
                "warnings": warnings,
                "config": if args.show_config { Some(redacted(&config)) } else { None },
            });
            println!("{}", pretty(&output));
        }
    }

    if args.strict && !warnings.is_empty() {
        return Err(BinError::config(format!(
            "Strict mode: {} warning(s) found",
            warnings.len()
        )));
    }

    Ok(())
}

/// Lists settings that are valid but probably unintended.
pub fn collect_warnings(config: &TenderConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.storage.backend == StorageBackend::Memory {
        warnings.push("Memory storage is configured; records are lost on exit".to_string());
    }
    if !config
        .bootstrap
        .users
        .iter()
        .any(|user| user.parsed_roles().contains(&Role::Admin))
    {
        warnings.push("No bootstrap account has ROLE_ADMIN".to_string());
    }
    if config.security.jwt.expiration_secs > LONG_TOKEN_SECS {
        warnings.push(format!(
            "Tokens live for {} days",
            config.security.jwt.expiration_secs / 86_400
        ));
    }
    if config.server.cors.enabled && config.server.cors.allowed_origins.is_empty() {
        warnings.push("CORS allows any origin".to_string());
    }

    warnings
}

/// Serializes the configuration with secrets masked.
fn redacted(config: &TenderConfig) -> Value {
    let mut value = serde_json::to_value(config).unwrap_or(Value::Null);

    if let Some(secret) = value.pointer_mut("/security/jwt/secret") {
        if !secret.is_null() {
            *secret = Value::from("***");
        }
    }
    if let Some(Value::Array(users)) = value.pointer_mut("/bootstrap/users") {
        for user in users {
            if let Some(password) = user.get_mut("password") {
                *password = Value::from("***");
            }
        }
    }

    value
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "(serialization error)".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tender_config::{BootstrapUser, SecretValue};

    fn config() -> TenderConfig {
        let mut config = TenderConfig::default();
        config.security.jwt.secret = Some(SecretValue::new("validate-test-secret-long-enough-1234"));
        config.bootstrap.users.push(BootstrapUser {
            user_name: "admin".into(),
            email: "admin@example.org".into(),
            password: SecretValue::new("admin-password"),
            roles: vec!["ROLE_ADMIN".into()],
        });
        config.server.cors.allowed_origins = vec!["https://example.org".into()];
        config
    }

    #[test]
    fn test_clean_config_has_no_warnings() {
        assert!(collect_warnings(&config()).is_empty());
    }

    #[test]
    fn test_warnings() {
        let mut config = config();
        config.storage.backend = StorageBackend::Memory;
        config.bootstrap.users.clear();
        config.security.jwt.expiration_secs = 90 * 86_400;
        config.server.cors.allowed_origins.clear();

        assert_eq!(collect_warnings(&config).len(), 4);
    }

    #[test]
    fn test_redacted_hides_secrets() {
        let value = redacted(&config());
        let text = value.to_string();

        assert!(!text.contains("validate-test-secret"));
        assert!(!text.contains("admin-password"));
        assert_eq!(value.pointer("/security/jwt/secret"), Some(&Value::from("***")));
        assert_eq!(
            value.pointer("/bootstrap/users/0/user_name"),
            Some(&Value::from("admin"))
        );
    }
}
