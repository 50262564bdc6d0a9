// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use assert_cmd::Command;
use erg_core::{RaceConfig, SequentialIdGen, SystemClock};
use erg_daemon::server::{self, ServerContext};
use erg_engine::RaceEngine;
use erg_storage::JournalStore;
use tempfile::TempDir;
use tokio::net::UnixListener;
use tokio::runtime::Runtime;

/// An in-process daemon serving the real request handler on a temp socket
pub struct TestDaemon {
    _runtime: Runtime,
    pub socket: PathBuf,
    pub dir: TempDir,
}

impl TestDaemon {
    pub fn start() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let socket = dir.path().join("ergd.sock");

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("Failed to build runtime");

        let listener = {
            let _guard = runtime.enter();
            UnixListener::bind(&socket).expect("Failed to bind socket")
        };

        let engine = RaceEngine::new(
            JournalStore::in_memory(),
            SystemClock,
            SequentialIdGen::default(),
            RaceConfig::default(),
        );
        let ctx = Arc::new(ServerContext::new(engine, Duration::from_secs(5)));

        runtime.spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let ctx = Arc::clone(&ctx);
                tokio::spawn(async move {
                    let (reader, writer) = stream.into_split();
                    let _ = server::handle_connection(&ctx, reader, writer).await;
                });
            }
        });

        Self {
            _runtime: runtime,
            socket,
            dir,
        }
    }

    /// `erg --socket <this daemon>` with a clean environment
    pub fn erg(&self) -> Command {
        let mut cmd = erg();
        cmd.arg("--socket").arg(&self.socket);
        cmd
    }
}

/// The erg binary with no inherited erg env vars
pub fn erg() -> Command {
    let mut cmd = Command::cargo_bin("erg").expect("erg binary");
    for var in ["ERG_USER", "ERG_SOCKET", "ERG_CONFIG", "ERG_LOG"] {
        cmd.env_remove(var);
    }
    cmd
}

/// Parse stdout of a `--format json` run
pub fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().expect("Failed to run erg");
    assert!(
        output.status.success(),
        "erg failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}
