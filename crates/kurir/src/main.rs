// SPDX-FileCopyrightText: 2026 Kurir Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Kurir - Firebase-to-Kommo CRM event bridge.
//!
//! This is the binary entry point for the Kurir bridge.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod check;
mod serve;
mod shutdown;

/// Kurir - Firebase-to-Kommo CRM event bridge.
#[derive(Parser, Debug)]
#[command(name = "kurir", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the event bridge (default).
    Serve,
    /// Verify connectivity to the configured external services.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup; a misconfigured process
    // never enters the event loop.
    let config = match kurir_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            kurir_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Check) => check::run_check(config).await,
        Some(Commands::Serve) | None => serve::run_serve(config).await,
    };

    if let Err(e) = result {
        eprintln!("kurir: {e}");
        std::process::exit(1);
    }
}
