// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! erg - live erg races from the command line

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod error;
mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{daemon, race};
use erg_core::UserId;
use erg_daemon::Config;

use crate::client::{ClientError, DaemonClient};
use crate::error::ErgError;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "erg", version, about = "Erg races - row against friends in real time")]
struct Cli {
    /// Daemon socket (defaults to ergd.sock in the state directory)
    #[arg(long, global = true, env = "ERG_SOCKET")]
    socket: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Acting user id
    #[arg(long, global = true, env = "ERG_USER")]
    user: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a race and join it as its first rower
    Create(race::CreateArgs),
    /// Join a race by its token
    Join(race::JoinArgs),
    /// Mark yourself ready (or not) to start
    Ready(race::ReadyArgs),
    /// Start a race whose countdown has run out
    Start(race::StartArgs),
    /// Report total distance rowed
    Progress(race::ProgressArgs),
    /// Show a race and its rowers
    Show(race::ShowArgs),
    /// List races you have taken part in
    History,
    /// Show every progress report of a race
    Log(race::LogArgs),
    /// Daemon management
    Daemon(daemon::DaemonArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging();

    let socket_path = match resolve_socket(cli.socket.clone()) {
        Ok(path) => path,
        Err(e) => {
            eprint!("{}", render(&e, Path::new("")));
            return ExitCode::FAILURE;
        }
    };

    match run(cli, &socket_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprint!("{}", render(&e, &socket_path));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, socket_path: &Path) -> Result<()> {
    let format = cli.format;
    let client = || DaemonClient::connect(socket_path);
    let user = || cli.user.map(UserId).ok_or_else(ErgError::missing_user);

    match cli.command {
        Commands::Create(args) => race::create(&client()?, user()?, args, format).await,
        Commands::Join(args) => race::join(&client()?, user()?, args).await,
        Commands::Ready(args) => race::ready(&client()?, user()?, args).await,
        Commands::Start(args) => race::start(&client()?, args).await,
        Commands::Progress(args) => race::progress(&client()?, user()?, args).await,
        Commands::Show(args) => race::show(&client()?, args, format).await,
        Commands::History => race::history(&client()?, user()?, format).await,
        Commands::Log(args) => race::log(&client()?, args, format).await,
        // Manages its own connection
        Commands::Daemon(args) => daemon::daemon(args, socket_path, format).await,
    }
}

/// `--socket`, else the socket of the configured daemon
fn resolve_socket(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => Ok(Config::load(None)?.socket_path),
    }
}

fn render(err: &anyhow::Error, socket_path: &Path) -> String {
    if let Some(client_err) = err.downcast_ref::<ClientError>() {
        return ErgError::from_client(client_err, socket_path).to_string();
    }
    if let Some(erg_err) = err.downcast_ref::<ErgError>() {
        return erg_err.to_string();
    }
    format!("error: {:#}\n", err)
}

fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("ERG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
