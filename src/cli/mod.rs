//! CLI module - Command-line interface for pam
//!
//! This module provides a structured CLI using clap for argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// pam - remote password and secret manager
#[derive(Debug, Parser)]
#[command(name = "pam")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default search paths
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Run the API server (default)
    #[command(alias = "s")]
    Serve,

    /// Write a default config file if none exists
    InitConfig,

    /// Load and validate the config, then exit
    CheckConfig,
}

impl Cli {
    #[must_use]
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["pam"]).unwrap();
        assert!(matches!(cli.command(), Commands::Serve));
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["pam", "check-config", "--config", "/tmp/pam.toml"]).unwrap();
        assert!(matches!(cli.command(), Commands::CheckConfig));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/pam.toml")));
    }
}
