// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Taskbridge - a Discord bot mirroring a Jira workflow through n8n webhooks.
//!
//! This is the binary entry point.

mod check;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Taskbridge - Jira workflow on Discord.
#[derive(Parser, Debug)]
#[command(name = "taskbridge", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect to Discord and process reactions and slash commands.
    Serve,
    /// Validate the configuration and print a summary.
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match taskbridge_config::load_and_validate(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            taskbridge_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    if let Err(errors) = taskbridge_config::validate_for_serve(&config) {
        taskbridge_config::render_errors(&errors);
        std::process::exit(1);
    }

    match cli.command {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Commands::CheckConfig => {
            println!("{}", check::summary(&config));
        }
    }
}
