// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `version` command.

use crate::cli::Cli;
use crate::error::BinResult;

/// Workspace crates and their versions.
fn components() -> [(&'static str, &'static str); 5] {
    [
        ("tender-bin", crate::VERSION),
        ("tender-core", tender_core::VERSION),
        ("tender-store", tender_store::VERSION),
        ("tender-config", tender_config::VERSION),
        ("tender-api", tender_api::VERSION),
    ]
}

/// Prints crate versions and the supported backends.
pub fn version(cli: &Cli) -> BinResult<()> {
    println!("tender {}", crate::VERSION);

    if cli.quiet {
        return Ok(());
    }

    println!();
    println!("Components:");
    for (name, version) in components() {
        println!("  {name:<14} {version}");
    }
    println!();
    println!("Storage backends: memory, sqlite");
    println!("Token algorithms: HS256, HS384, HS512");
    println!(
        "Platform:         {}-{}",
        std::env::consts::ARCH,
        std::env::consts::OS
    );
    println!();
    println!("License: PolyForm Noncommercial License 1.0.0");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components_share_workspace_version() {
        for (name, version) in components() {
            assert_eq!(version, crate::VERSION, "{name}");
        }
    }
}
