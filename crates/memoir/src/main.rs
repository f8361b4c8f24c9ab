// SPDX-FileCopyrightText: 2026 Memoir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memoir - a multi-tenant chat backend with persistent memory.
//!
//! Binary entry point.

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Memoir - a multi-tenant chat backend with persistent memory.
#[derive(Parser, Debug)]
#[command(name = "memoir", version, about, long_about = None)]
struct Cli {
    /// Path to a configuration file (overrides the default lookup).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Memoir server (the default).
    Serve,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => memoir_config::load_config_from_path(path),
        None => memoir_config::load_config(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("memoir: configuration error: {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) | None => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("memoir: {e}");
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_serve_with_config_path() {
        let cli = Cli::try_parse_from(["memoir", "serve", "--config", "/tmp/memoir.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve)));
        assert!(cli.config.is_some());
    }

    #[test]
    fn cli_defaults_to_serve() {
        let cli = Cli::try_parse_from(["memoir"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }
}
