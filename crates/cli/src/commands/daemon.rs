// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon management: start, stop, status, ping

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};
use erg_daemon::config::{Config, LOCK_FILE};

use crate::client::{self, ClientError, DaemonClient};
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start ergd in the background
    Start {
        /// Config file passed through to ergd
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Stop the running daemon
    Stop,
    /// Show daemon uptime and race counts
    Status,
    /// Check the daemon answers
    Ping,
}

pub async fn daemon(args: DaemonArgs, socket_path: &Path, format: OutputFormat) -> Result<()> {
    match args.command {
        DaemonCommand::Start { config } => start(config).await,
        DaemonCommand::Stop => stop(socket_path).await,
        DaemonCommand::Status => status(socket_path, format).await,
        DaemonCommand::Ping => {
            let client = DaemonClient::connect(socket_path)?;
            let version = client.hello().await?;
            println!("pong (protocol {})", version);
            Ok(())
        }
    }
}

async fn start(config_path: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config_path.as_deref())?;

    if let Ok(client) = DaemonClient::connect(&config.socket_path) {
        if client.hello().await.is_ok() {
            println!("Daemon already running");
            return Ok(());
        }
    }

    let child = client::start_daemon_background(config_path.as_deref())?;
    let client = DaemonClient::connect_with_retry(
        config.socket_path.clone(),
        &config.log_path,
        client::timeout_connect(),
        child,
    )?;
    println!("Daemon started ({})", client.socket_path().display());
    Ok(())
}

async fn stop(socket_path: &Path) -> Result<()> {
    let lock_path = socket_path
        .parent()
        .map_or_else(|| PathBuf::from(LOCK_FILE), |dir| dir.join(LOCK_FILE));

    if client::daemon_stop(socket_path, &lock_path).await? {
        println!("Daemon stopped");
    } else {
        println!("Daemon not running");
    }
    Ok(())
}

async fn status(socket_path: &Path, format: OutputFormat) -> Result<()> {
    let client = match DaemonClient::connect(socket_path) {
        Ok(client) => client,
        Err(ClientError::DaemonNotRunning) => {
            println!("Daemon not running");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match client.status().await {
        Ok(status) => output::print(&status, format),
        Err(ClientError::DaemonNotRunning) => println!("Daemon not running"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
