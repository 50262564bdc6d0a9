// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol between `erg` and `ergd`.
//!
//! Every message is a 4-byte big-endian length prefix followed by a JSON
//! body. A connection carries exactly one request and one response.

use std::time::Duration;

use erg_core::{ProgressUpdate, Race, RaceId, RaceToken, UserId};
use erg_engine::{ErrorKind, RaceHistoryEntry, RaceSnapshot};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Bumped whenever a request or response shape changes incompatibly
pub const PROTOCOL_VERSION: &str = "1";

/// Default time allowed for reading or writing one message
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on a single message body
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Client requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    Ping,
    Hello {
        version: String,
    },
    Status,
    Shutdown,
    CreateRace {
        user_id: UserId,
        distance: i64,
    },
    JoinRace {
        token: RaceToken,
        user_id: UserId,
    },
    /// Toggle readiness; marking ready also evaluates the countdown
    SetReady {
        race_id: RaceId,
        user_id: UserId,
        ready: bool,
    },
    EvaluateCountdown {
        race_id: RaceId,
    },
    StartRace {
        race_id: RaceId,
    },
    ReportProgress {
        race_id: RaceId,
        user_id: UserId,
        distance: i64,
    },
    Query {
        query: Query,
    },
}

/// Read-only lookups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Query {
    GetRace { token: RaceToken },
    GetRaceById { race_id: RaceId },
    RaceHistory { user_id: UserId },
    ProgressLog { race_id: RaceId },
}

/// Daemon responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Ok,
    Pong,
    Hello {
        version: String,
    },
    Status {
        uptime_secs: u64,
        races_waiting: usize,
        races_countdown: usize,
        races_active: usize,
    },
    ShuttingDown,
    RaceCreated {
        race: Race,
    },
    /// Whether this call scheduled the countdown
    Countdown {
        scheduled: bool,
    },
    Race {
        snapshot: RaceSnapshot,
    },
    History {
        races: Vec<RaceHistoryEntry>,
    },
    Progress {
        updates: Vec<ProgressUpdate>,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message of {size} bytes exceeds limit of {max}")]
    MessageTooLarge { size: usize, max: usize },

    #[error("connection closed")]
    ConnectionClosed,

    #[error("timed out")]
    Timeout,
}

/// Serialize a message body (no length prefix)
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(message)?)
}

/// Deserialize a message body
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read one length-prefixed message body
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut prefix = [0u8; 4];
    match reader.read_exact(&mut prefix).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed)
        }
        Err(e) => return Err(e.into()),
    }

    let size = u32::from_be_bytes(prefix) as usize;
    if size > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut body = vec![0u8; size];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

/// Write one message body with its length prefix
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    body: &[u8],
) -> Result<(), ProtocolError> {
    if body.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: body.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    let len = u32::try_from(body.len()).map_err(|_| ProtocolError::MessageTooLarge {
        size: body.len(),
        max: MAX_MESSAGE_SIZE,
    })?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_request<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, ProtocolError> {
    let body = tokio::time::timeout(timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&body)
}

pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    let body = encode(response)?;
    tokio::time::timeout(timeout, write_message(writer, &body))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
