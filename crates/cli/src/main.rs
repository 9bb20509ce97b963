//! Range Cart CLI
//!
//! Manages the locally persisted cart from the terminal and places orders
//! with the configured backend.

use std::{io, process::ExitCode};

use tracing::error;

use crate::config::Cli;

mod commands;
mod config;
mod observability;
mod view;

/// Range Cart CLI entry point
#[tokio::main]
pub async fn main() -> ExitCode {
    let cli = match Cli::load() {
        Ok(cli) => cli,
        Err(error) => {
            _ = error.print();

            return ExitCode::from(u8::try_from(error.exit_code()).unwrap_or(1));
        }
    };

    if let Err(error) = observability::init(&cli) {
        #[expect(
            clippy::print_stderr,
            reason = "logging not initialized, must use eprintln"
        )]
        {
            eprintln!("{error}");
        }

        return ExitCode::FAILURE;
    }

    let mut stdout = io::stdout().lock();

    match commands::run(cli, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("{error}");

            #[expect(clippy::print_stderr, reason = "user-facing error message")]
            {
                eprintln!("error: {error}");
            }

            ExitCode::FAILURE
        }
    }
}
