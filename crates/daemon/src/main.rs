// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Erg race daemon (ergd)
//!
//! Owns the race journal, serves client requests and starts races whose
//! countdown has expired.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::PathBuf;
use std::sync::Arc;

use erg_daemon::config::Config;
use erg_daemon::lifecycle::{self, LifecycleError};
use erg_daemon::server;
use tokio::signal::unix::{signal, SignalKind};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = parse_args(std::env::args().skip(1))?;
    let config = Config::load(config_path.as_deref())?;

    // Write startup marker to log (before tracing setup, so the CLI can find it)
    write_startup_marker(&config)?;

    let log_guard = setup_logging(&config)?;

    info!(state_dir = %config.state_dir.display(), "starting ergd");

    let daemon = match lifecycle::startup(&config).await {
        Ok(d) => d,
        Err(e) => {
            // Tracing is non-blocking and may not flush before exit
            write_startup_error(&config, &e);
            error!("failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(socket = %config.socket_path.display(), "daemon ready");

    // Signal ready for parent process
    println!("READY");

    let mut ticker = tokio::time::interval(config.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctx = Arc::clone(&daemon.context);
    loop {
        tokio::select! {
            result = daemon.listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        let ctx = Arc::clone(&ctx);
                        tokio::spawn(async move {
                            let (reader, writer) = stream.into_split();
                            if let Err(e) = server::handle_connection(&ctx, reader, writer).await {
                                error!("error handling connection: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("error accepting connection: {}", e);
                    }
                }
            }

            // Countdown expiry
            _ = ticker.tick() => {
                match ctx.engine.start_due_races().await {
                    Ok(started) if !started.is_empty() => {
                        debug!(count = started.len(), "started due races");
                    }
                    Ok(_) => {}
                    Err(e) => error!("error starting due races: {}", e),
                }
            }

            _ = ctx.shutdown_requested() => {
                info!("shutdown requested via IPC");
                break;
            }

            _ = sigterm.recv() => {
                info!("received SIGTERM");
                break;
            }

            _ = sigint.recv() => {
                info!("received SIGINT");
                break;
            }
        }
    }

    daemon.shutdown();
    info!("daemon stopped");
    Ok(())
}

/// `ergd [--config PATH]`
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<PathBuf>, String> {
    let mut config = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().ok_or("--config requires a path")?;
                config = Some(PathBuf::from(path));
            }
            other => {
                if let Some(path) = other.strip_prefix("--config=") {
                    config = Some(PathBuf::from(path));
                } else {
                    return Err(format!("unexpected argument: {}", other));
                }
            }
        }
    }
    Ok(config)
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- ergd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- ergd: starting (pid: ";

fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write startup error synchronously to log file
fn write_startup_error(config: &Config, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR failed to start daemon: {}", error);
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let file_appender =
        tracing_appender::rolling::never(&config.state_dir, erg_daemon::config::LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
