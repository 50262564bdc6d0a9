// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use erg_core::{ProgressUpdate, Race, RaceId, RaceToken, UserId};
use erg_daemon::protocol::{self, ProtocolError};
use erg_daemon::{Query, Request, Response, PROTOCOL_VERSION};
use erg_engine::{ErrorKind, RaceHistoryEntry, RaceSnapshot};
use thiserror::Error;
use tokio::net::UnixStream;
use tracing::debug;

// Timeout configuration (env vars in milliseconds)
fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for IPC requests
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("ERG_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for daemon to start
pub fn timeout_connect() -> Duration {
    parse_duration_ms("ERG_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for process to exit
pub fn timeout_exit() -> Duration {
    parse_duration_ms("ERG_TIMEOUT_EXIT_MS").unwrap_or(Duration::from_secs(2))
}

/// Polling interval for retries
pub fn poll_interval() -> Duration {
    parse_duration_ms("ERG_POLL_INTERVAL_MS").unwrap_or(Duration::from_millis(50))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running")]
    DaemonNotRunning,

    #[error("failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{message}")]
    Rejected { kind: ErrorKind, message: String },

    #[error("unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turn a non-success response into the matching client error
fn unexpected(response: Response) -> ClientError {
    match response {
        Response::Error { kind, message } => ClientError::Rejected { kind, message },
        _ => ClientError::UnexpectedResponse,
    }
}

/// Daemon client
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Connect to an existing daemon (no auto-start)
    pub fn connect(socket_path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let socket_path = socket_path.into();
        if !socket_path.exists() {
            return Err(ClientError::DaemonNotRunning);
        }
        Ok(Self { socket_path })
    }

    /// Wait for a freshly spawned daemon to accept connections
    ///
    /// Watches the child so an early exit is reported with the error the
    /// daemon wrote to its log instead of a bare timeout.
    pub fn connect_with_retry(
        socket_path: PathBuf,
        log_path: &Path,
        timeout: Duration,
        mut child: std::process::Child,
    ) -> Result<Self, ClientError> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            match child.try_wait() {
                Ok(Some(status)) => {
                    // Filesystem may lag the exit
                    let poll_start = Instant::now();
                    while poll_start.elapsed() < timeout_exit() {
                        if let Some(err) = read_startup_error(log_path) {
                            return Err(ClientError::DaemonStartFailed(err));
                        }
                        std::thread::sleep(poll_interval());
                    }
                    return Err(ClientError::DaemonStartFailed(format!(
                        "exited with {}",
                        status
                    )));
                }
                Ok(None) => {}
                Err(e) => return Err(ClientError::Io(e)),
            }

            if std::os::unix::net::UnixStream::connect(&socket_path).is_ok() {
                return Ok(Self { socket_path });
            }
            std::thread::sleep(poll_interval());
        }

        Err(read_startup_error(log_path)
            .map(ClientError::DaemonStartFailed)
            .unwrap_or(ClientError::DaemonStartTimeout))
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Send a request and receive a response with specific timeouts
    async fn send_with_timeout(
        &self,
        request: Request,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = match UnixStream::connect(&self.socket_path).await {
            Ok(stream) => stream,
            // Socket file left behind by a daemon that is gone
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                return Err(ClientError::DaemonNotRunning)
            }
            Err(e) => return Err(e.into()),
        };
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(&request)?;
        tokio::time::timeout(write_timeout, protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let response_bytes =
            tokio::time::timeout(read_timeout, protocol::read_message(&mut reader))
                .await
                .map_err(|_| ProtocolError::Timeout)??;

        let response: Response = protocol::decode(&response_bytes)?;
        Ok(response)
    }

    /// Send a request and receive a response
    pub async fn send(&self, request: Request) -> Result<Response, ClientError> {
        debug!(?request, socket = %self.socket_path.display(), "sending request");
        self.send_with_timeout(request, timeout_ipc(), timeout_ipc())
            .await
    }

    async fn query(&self, query: Query) -> Result<Response, ClientError> {
        self.send(Request::Query { query }).await
    }

    pub async fn create_race(&self, user_id: UserId, distance: i64) -> Result<Race, ClientError> {
        match self.send(Request::CreateRace { user_id, distance }).await? {
            Response::RaceCreated { race } => Ok(race),
            other => Err(unexpected(other)),
        }
    }

    pub async fn join_race(&self, token: RaceToken, user_id: UserId) -> Result<(), ClientError> {
        match self.send(Request::JoinRace { token, user_id }).await? {
            Response::Ok => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Returns whether this call scheduled the countdown
    pub async fn set_ready(
        &self,
        race_id: RaceId,
        user_id: UserId,
        ready: bool,
    ) -> Result<bool, ClientError> {
        match self
            .send(Request::SetReady {
                race_id,
                user_id,
                ready,
            })
            .await?
        {
            Response::Countdown { scheduled } => Ok(scheduled),
            other => Err(unexpected(other)),
        }
    }

    pub async fn start_race(&self, race_id: RaceId) -> Result<(), ClientError> {
        match self.send(Request::StartRace { race_id }).await? {
            Response::Ok => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub async fn report_progress(
        &self,
        race_id: RaceId,
        user_id: UserId,
        distance: i64,
    ) -> Result<(), ClientError> {
        match self
            .send(Request::ReportProgress {
                race_id,
                user_id,
                distance,
            })
            .await?
        {
            Response::Ok => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub async fn get_race(&self, token: RaceToken) -> Result<RaceSnapshot, ClientError> {
        match self.query(Query::GetRace { token }).await? {
            Response::Race { snapshot } => Ok(snapshot),
            other => Err(unexpected(other)),
        }
    }

    pub async fn get_race_by_id(&self, race_id: RaceId) -> Result<RaceSnapshot, ClientError> {
        match self.query(Query::GetRaceById { race_id }).await? {
            Response::Race { snapshot } => Ok(snapshot),
            other => Err(unexpected(other)),
        }
    }

    pub async fn race_history(&self, user_id: UserId) -> Result<Vec<RaceHistoryEntry>, ClientError> {
        match self.query(Query::RaceHistory { user_id }).await? {
            Response::History { races } => Ok(races),
            other => Err(unexpected(other)),
        }
    }

    pub async fn progress_log(&self, race_id: RaceId) -> Result<Vec<ProgressUpdate>, ClientError> {
        match self.query(Query::ProgressLog { race_id }).await? {
            Response::Progress { updates } => Ok(updates),
            other => Err(unexpected(other)),
        }
    }

    /// Get daemon status
    pub async fn status(&self) -> Result<DaemonStatus, ClientError> {
        match self.send(Request::Status).await? {
            Response::Status {
                uptime_secs,
                races_waiting,
                races_countdown,
                races_active,
            } => Ok(DaemonStatus {
                uptime_secs,
                races_waiting,
                races_countdown,
                races_active,
            }),
            other => Err(unexpected(other)),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(Request::Shutdown).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Get daemon protocol version via Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        match self
            .send(Request::Hello {
                version: PROTOCOL_VERSION.to_string(),
            })
            .await?
        {
            Response::Hello { version } => Ok(version),
            other => Err(unexpected(other)),
        }
    }
}

/// Summary returned by `Request::Status`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DaemonStatus {
    pub uptime_secs: u64,
    pub races_waiting: usize,
    pub races_countdown: usize,
    pub races_active: usize,
}

/// Start the daemon in the background, returning the child process handle
pub fn start_daemon_background(config: Option<&Path>) -> Result<std::process::Child, ClientError> {
    let ergd_path = find_ergd_binary();

    let mut command = Command::new(&ergd_path);
    if let Some(config) = config {
        command.arg("--config").arg(config);
    }
    command
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(format!("{}: {}", ergd_path.display(), e)))
}

/// Stop the daemon (graceful first, then forceful)
///
/// Returns true if a daemon was stopped, false if none was running.
pub async fn daemon_stop(socket_path: &Path, lock_path: &Path) -> Result<bool, ClientError> {
    let client = match DaemonClient::connect(socket_path) {
        Ok(c) => c,
        Err(ClientError::DaemonNotRunning) => return Ok(false),
        Err(e) => return Err(e),
    };

    let shutdown_result = client.shutdown().await;
    if matches!(shutdown_result, Err(ClientError::DaemonNotRunning)) {
        return Ok(false);
    }

    if let Some(pid) = read_daemon_pid(lock_path) {
        if shutdown_result.is_ok() {
            wait_for_exit(pid, timeout_exit()).await;
        }

        if process_exists(pid) {
            force_kill_daemon(pid);
            wait_for_exit(pid, timeout_exit()).await;
        }
    }

    Ok(true)
}

/// Wait for a process to exit
async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_exists(pid) {
            return true;
        }
        tokio::time::sleep(poll_interval()).await;
    }
    false
}

/// Find the ergd binary
fn find_ergd_binary() -> PathBuf {
    // Explicit override (used by tests to ensure correct binary)
    if let Ok(path) = std::env::var("ERG_DAEMON_BINARY") {
        return PathBuf::from(path);
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("ergd");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    // Fall back to PATH lookup
    PathBuf::from("ergd")
}

/// Get the PID from the daemon PID file, if it exists
pub fn read_daemon_pid(lock_path: &Path) -> Option<u32> {
    std::fs::read_to_string(lock_path)
        .ok()
        .and_then(|content| content.trim().parse::<u32>().ok())
}

/// Check if a process with the given PID exists
pub fn process_exists(pid: u32) -> bool {
    // kill -0 checks existence without sending a signal
    Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Force kill a daemon process
pub fn force_kill_daemon(pid: u32) -> bool {
    Command::new("kill")
        .args(["-9", &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Startup marker prefix the daemon writes to its log before anything else
const STARTUP_MARKER_PREFIX: &str = "--- ergd: starting (pid: ";

/// Errors logged since the last startup marker, if any
pub fn read_startup_error(log_path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(log_path).ok()?;

    let start_pos = content.rfind(STARTUP_MARKER_PREFIX)?;
    let startup_log = &content[start_pos..];

    let errors: Vec<&str> = startup_log
        .lines()
        .filter(|line| line.contains(" ERROR ") || line.starts_with("ERROR "))
        .collect();

    if errors.is_empty() {
        return None;
    }

    // Lines look like "timestamp LEVEL target: message"; keep the message
    let messages: Vec<String> = errors
        .iter()
        .map(|line| {
            line.split_once(": ")
                .map_or_else(|| line.to_string(), |(_, msg)| msg.to_string())
        })
        .collect();
    Some(messages.join("\n"))
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
