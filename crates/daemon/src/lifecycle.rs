// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, recovery.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use erg_core::{ConfigError, RaceStatus, SystemClock, UuidIdGen};
use erg_engine::RaceEngine;
use erg_storage::{JournalStore, RaceStore, StoreError, TracedStore};
use fs2::FileExt;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::config::Config;
use crate::server::ServerContext;

/// Store stack the daemon runs on
pub type DaemonStore = TracedStore<JournalStore>;

pub type DaemonContext = ServerContext<DaemonStore, SystemClock, UuidIdGen>;

/// Daemon state during operation
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub listener: UnixListener,
    pub context: Arc<DaemonContext>,
}

impl DaemonState {
    /// Remove the socket and pid file; the lock is released on drop
    pub fn shutdown(&self) {
        info!("shutting down daemon");

        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("failed to remove socket file: {}", e);
            }
        }

        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("failed to remove PID file: {}", e);
            }
        }

        info!("daemon shutdown complete");
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    let mut lock_held = false;
    match startup_inner(config, &mut lock_held).await {
        Ok(state) => Ok(state),
        Err(e) => {
            cleanup_on_failure(config, lock_held);
            Err(e)
        }
    }
}

async fn startup_inner(
    config: &Config,
    lock_held: &mut bool,
) -> Result<DaemonState, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Lock before touching the WAL or socket; a second daemon must not get past here
    let mut lock_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    *lock_held = true;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    let store = JournalStore::open(&config.wal_path)?;
    reconcile_state(&store).await?;

    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    let engine = RaceEngine::new(
        TracedStore::new(store),
        SystemClock,
        UuidIdGen,
        config.race.clone(),
    );
    let context = Arc::new(ServerContext::new(engine, config.request_timeout));

    info!(state_dir = %config.state_dir.display(), "daemon started");

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        listener,
        context,
    })
}

/// Log races that were mid-flight when the previous daemon stopped
async fn reconcile_state(store: &JournalStore) -> Result<(), StoreError> {
    let countdown = store.races_in_status(RaceStatus::Countdown).await?;
    let active = store.races_in_status(RaceStatus::Active).await?;
    let waiting = store.races_in_status(RaceStatus::Waiting).await?;

    info!(
        waiting = waiting.len(),
        countdown = countdown.len(),
        active = active.len(),
        "loaded race state"
    );
    for race in &countdown {
        // Started by the first tick if the deadline passed while down
        info!(race_id = %race.id, countdown_at = ?race.countdown_at, "race resumes counting down");
    }
    Ok(())
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config, lock_held: bool) {
    // Socket and pid file belong to whichever daemon holds the lock
    if !lock_held {
        return;
    }

    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
