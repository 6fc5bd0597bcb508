// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `gen-token` and `hash-password` commands.

use std::io::{self, Read};
use std::time::Duration;

use tender_api::JwtManager;
use tender_core::Role;

use crate::cli::{Cli, GenTokenArgs, HashPasswordArgs};
use crate::error::{BinError, BinResult};
use crate::runtime::api_config_from;

/// Executes the `gen-token` command.
///
/// Signs with the secret and issuer from the configuration file, so the
/// token is accepted by a server started from the same file.
pub fn gen_token(cli: &Cli, args: GenTokenArgs) -> BinResult<()> {
    let config = tender_config::load_config(&cli.config)?;
    let roles = parse_roles(&args.roles)?;

    let mut jwt = api_config_from(&config)?.jwt;
    if let Some(secs) = args.expires_in {
        jwt = jwt.with_expiration(Duration::from_secs(secs));
    }

    let manager = JwtManager::new(jwt)?;
    let token = manager.create_access_token(&args.user_name, &roles)?;

    println!("{token}");
    eprintln!();
    eprintln!(
        "Token for '{}' with {:?}, valid for {}s",
        args.user_name,
        roles.iter().map(Role::as_str).collect::<Vec<_>>(),
        manager.expiration_secs()
    );

    Ok(())
}

/// Parses role names strictly; an unknown name is an error.
pub fn parse_roles(names: &[String]) -> BinResult<Vec<Role>> {
    if let Some(unknown) = names.iter().find(|name| Role::parse(name).is_none()) {
        return Err(BinError::config(format!(
            "Unknown role '{unknown}'; expected one of {}",
            Role::ALL.map(|role| role.as_str()).join(", ")
        )));
    }
    Ok(Role::parse_all(names.iter().map(String::as_str)))
}

/// Executes the `hash-password` command.
pub fn hash_password(_cli: &Cli, args: HashPasswordArgs) -> BinResult<()> {
    let password = if args.stdin {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .map_err(|e| BinError::io(format!("Failed to read from stdin: {e}")))?;
        input.trim_end_matches(['\r', '\n']).to_string()
    } else {
        args.password
            .ok_or_else(|| BinError::config("No password provided. Use --stdin or pass a value"))?
    };

    if password.is_empty() {
        return Err(BinError::config("Password must not be empty"));
    }

    println!("{}", tender_api::auth::hash_password(&password)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roles() {
        let roles = parse_roles(&["ROLE_EMAIL".into(), "ROLE_USER".into()]).unwrap();
        assert_eq!(roles, vec![Role::User, Role::Email]);

        let err = parse_roles(&["ROLE_SUPERUSER".into()]).unwrap_err();
        assert!(err.to_string().contains("ROLE_SUPERUSER"));
        assert_eq!(err.exit_code(), 1);
    }
}
