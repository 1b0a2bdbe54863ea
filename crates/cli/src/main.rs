//! Haardhout CLI - Operator tools for shipping prices.
//!
//! # Usage
//!
//! ```bash
//! # Quote delivery of 3 cubic meters to Amsterdam
//! hh-cli quote "1015 CS" 3
//!
//! # Same, as JSON
//! hh-cli quote 1015CS 3 --json
//!
//! # Print the rate card with the price of 2 cubic meters per region
//! hh-cli rates --volume 2
//! ```
//!
//! # Commands
//!
//! - `quote` - Price a delivery with the same function the checkout uses
//! - `rates` - Print the published rate card

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "hh-cli")]
#[command(author, version, about = "Haardhout operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote the delivery price for a postal code and volume
    Quote {
        /// Dutch postal code (e.g. "1015 CS")
        postal_code: String,

        /// Volume in cubic meters
        volume: f64,

        /// Print the quote as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the rate card
    Rates {
        /// Also print the price of this volume for every region
        #[arg(short, long)]
        volume: Option<f64>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Quote {
            postal_code,
            volume,
            json,
        } => commands::quote::run(&postal_code, volume, json),
        Commands::Rates { volume } => commands::rates::run(volume),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}
