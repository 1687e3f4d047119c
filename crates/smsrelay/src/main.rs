// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMS relay - bridges a device message transport and an HTTP backend.
//!
//! This is the binary entry point for the relay daemon.

use clap::{Parser, Subcommand};

mod events;
mod scheduler;
mod serve;
mod shutdown;
mod transport;

/// SMS relay - bridges a device message transport and an HTTP backend.
#[derive(Parser, Debug)]
#[command(name = "smsrelay", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the relay daemon.
    Serve,
    /// Print the resolved configuration and exit.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match smsrelay_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            smsrelay_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("error: failed to render configuration: {e}");
                std::process::exit(1);
            }
        },
        Some(Commands::Serve) | None => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn binary_loads_config_defaults() {
        // Config loads with defaults, no config file needed.
        let config =
            smsrelay_config::load_and_validate().expect("default config should be valid");
        assert_eq!(config.relay.name, "smsrelay");
    }
}
