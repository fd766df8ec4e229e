// SPDX-License-Identifier: AGPL-3.0
// SimCar CLI - Main entry point
//
// Interactive terminal client for the SimCar used-car marketplace.

mod commands;
mod shell;
mod state;

use clap::Parser;
use shell::{ShellCommand, ShellLine};
use state::AppState;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "simcar")]
#[command(about = "Browse, search and favorite SimCar listings from the terminal")]
#[command(version)]
struct Cli {
    /// Backend base URL for this session, e.g. http://localhost:8080/api
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so they never interleave with command output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("simcar_cli=warn,simcar_core=warn")),
        )
        .init();

    let cli = Cli::parse();

    let state = match AppState::new(cli.api_url) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("simcar: failed to start: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "SimCar {} - connected to {}",
        env!("CARGO_PKG_VERSION"),
        state.client.base_url()
    );
    println!("Type `help` for the list of commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("simcar> ");
        let _ = std::io::stdout().flush();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Failed to read input: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let parsed = match ShellLine::parse_line(&line) {
            Ok(parsed) => parsed,
            Err(e) => {
                // Also covers `help` and `--help`
                let _ = e.print();
                continue;
            }
        };

        if matches!(parsed.command, ShellCommand::Quit) {
            break;
        }

        match commands::execute(&state, parsed.command).await {
            Ok(output) if output.is_empty() => {}
            Ok(output) => println!("{}", output),
            Err(message) => eprintln!("{}", message),
        }
    }
}
