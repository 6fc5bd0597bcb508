// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `run`: Start the server (default)
//! - `validate`: Validate configuration file
//! - `version`: Show version information
//! - `gen-token`: Sign a token with the configured secret
//! - `hash-password`: Hash a password for manual provisioning

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// Tender - procurement tracker
///
/// Stores procurement records and serves them to signed-in users, the
/// browser extension and integrations over a JWT-secured REST API.
#[derive(Parser, Debug)]
#[command(
    name = "tender",
    author = "Sylvex <contact@sylvex.io>",
    version = crate::VERSION,
    about = "Procurement tracker with a JWT-secured REST API",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "tender.yaml",
        env = "TENDER_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long, env = "TENDER_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Log format; overrides the config file
    #[arg(long, env = "TENDER_LOG_FORMAT", global = true)]
    pub log_format: Option<LogFormat>,

    /// Enable quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the API server
    ///
    /// This is the default command when no subcommand is specified.
    Run(RunArgs),

    /// Validate the configuration file
    ///
    /// Parses and validates the configuration file without starting the server.
    Validate(ValidateArgs),

    /// Show detailed version information
    Version,

    /// Sign an access token with the configured secret
    ///
    /// Useful for provisioning integrations such as the browser extension.
    #[command(name = "gen-token")]
    GenToken(GenTokenArgs),

    /// Hash a password with Argon2
    #[command(name = "hash-password")]
    HashPassword(HashPasswordArgs),
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `run` command.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Override the listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Keep everything in memory, ignoring the configured storage
    #[arg(long)]
    pub in_memory: bool,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ValidateArgs {
    /// Show parsed configuration after validation
    #[arg(short, long)]
    pub show_config: bool,

    /// Output format for validation results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Strict mode: treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the `gen-token` command.
#[derive(Args, Debug, Clone)]
pub struct GenTokenArgs {
    /// Token subject (user name)
    pub user_name: String,

    /// Role to grant (`ROLE_*`); repeatable
    #[arg(short, long = "role", default_value = "ROLE_USER")]
    pub roles: Vec<String>,

    /// Lifetime in seconds; defaults to the configured expiration
    #[arg(short, long)]
    pub expires_in: Option<u64>,
}

/// Arguments for the `hash-password` command.
#[derive(Args, Debug, Clone)]
pub struct HashPasswordArgs {
    /// Password to hash
    #[arg(required_unless_present = "stdin")]
    pub password: Option<String>,

    /// Read the password from stdin
    #[arg(long)]
    pub stdin: bool,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

impl From<tender_config::LogFormat> for LogFormat {
    fn from(format: tender_config::LogFormat) -> Self {
        match format {
            tender_config::LogFormat::Text => Self::Text,
            tender_config::LogFormat::Json => Self::Json,
            tender_config::LogFormat::Compact => Self::Compact,
        }
    }
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective command, defaulting to `Run` if none specified.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }

    /// Check if verbose logging is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose && !self.quiet
    }

    /// Resolves the log level and format.
    ///
    /// Flags win, then the `logging` section of the config file, then
    /// `info`/text. A config file that cannot be read is skipped here; the
    /// command reports it properly once logging is up.
    pub fn logging_settings(&self) -> (String, LogFormat) {
        let from_file = tender_config::ConfigLoader::new()
            .load(&self.config)
            .ok()
            .map(|config| config.logging);

        let level = if self.quiet {
            "warn".to_string()
        } else if self.verbose {
            "debug".to_string()
        } else if let Some(level) = &self.log_level {
            level.clone()
        } else {
            from_file
                .as_ref()
                .map(|logging| logging.level.as_str().to_string())
                .unwrap_or_else(|| "info".to_string())
        };

        let format = self
            .log_format
            .or_else(|| from_file.map(|logging| logging.format.into()))
            .unwrap_or_default();

        (level, format)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command() {
        let cli = Cli::parse_from(["tender"]);
        assert!(cli.command.is_none());
        assert!(matches!(cli.effective_command(), Commands::Run(_)));
    }

    #[test]
    fn test_run_command() {
        let cli = Cli::parse_from(["tender", "run", "--port", "9090", "--in-memory"]);
        let Some(Commands::Run(args)) = cli.command else {
            panic!("Expected Run command");
        };
        assert_eq!(args.port, Some(9090));
        assert!(args.in_memory);
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["tender", "validate", "--show-config", "-f", "json"]);
        let Some(Commands::Validate(args)) = cli.command else {
            panic!("Expected Validate command");
        };
        assert!(args.show_config);
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_config_path() {
        let cli = Cli::parse_from(["tender", "-c", "/etc/tender/tender.yaml"]);
        assert_eq!(cli.config, PathBuf::from("/etc/tender/tender.yaml"));
    }

    #[test]
    fn test_flags_override_logging() {
        let cli = Cli::parse_from([
            "tender",
            "-c",
            "/nonexistent/tender.yaml",
            "-l",
            "trace",
            "--log-format",
            "json",
        ]);
        assert_eq!(cli.logging_settings(), ("trace".to_string(), LogFormat::Json));

        let cli = Cli::parse_from(["tender", "-c", "/nonexistent/tender.yaml", "-q"]);
        assert_eq!(cli.logging_settings().0, "warn");

        let cli = Cli::parse_from(["tender", "-c", "/nonexistent/tender.yaml", "-v"]);
        assert!(cli.is_verbose());
        assert_eq!(cli.logging_settings().0, "debug");
    }

    #[test]
    fn test_gen_token_command() {
        let cli = Cli::parse_from([
            "tender",
            "gen-token",
            "extension",
            "-r",
            "ROLE_CHROME_EXTENSION",
            "-r",
            "ROLE_ADMIN",
        ]);
        let Some(Commands::GenToken(args)) = cli.command else {
            panic!("Expected GenToken command");
        };
        assert_eq!(args.user_name, "extension");
        assert_eq!(args.roles, vec!["ROLE_CHROME_EXTENSION", "ROLE_ADMIN"]);
        assert_eq!(args.expires_in, None);

        let cli = Cli::parse_from(["tender", "gen-token", "alice"]);
        let Some(Commands::GenToken(args)) = cli.command else {
            panic!("Expected GenToken command");
        };
        assert_eq!(args.roles, vec!["ROLE_USER"]);
    }

    #[test]
    fn test_hash_password_command() {
        let cli = Cli::parse_from(["tender", "hash-password", "s3cret-pass"]);
        let Some(Commands::HashPassword(args)) = cli.command else {
            panic!("Expected HashPassword command");
        };
        assert_eq!(args.password.as_deref(), Some("s3cret-pass"));

        assert!(Cli::try_parse_from(["tender", "hash-password"]).is_err());
    }
}
