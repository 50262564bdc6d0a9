// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.

use std::fmt;
use std::path::Path;

use erg_engine::ErrorKind;

use crate::client::ClientError;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct ErgError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
}

impl ErgError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn daemon_not_running(socket_path: &Path) -> Self {
        ErgError::new("daemon not running")
            .with_context(format!("no daemon listening at {}", socket_path.display()))
            .with_suggestion("Start it with: erg daemon start")
            .with_suggestion("Or point at another daemon with --socket / ERG_SOCKET")
    }

    pub fn missing_user() -> Self {
        ErgError::new("no user given")
            .with_suggestion("Pass --user ID or set ERG_USER")
    }

    /// A request the daemon refused
    pub fn rejected(kind: ErrorKind, message: &str) -> Self {
        let err = ErgError::new(message.to_string());
        match kind {
            ErrorKind::NotFound => {
                err.with_suggestion("Check the race token or id with: erg show TOKEN")
            }
            ErrorKind::InvalidState => {
                err.with_context("the race has moved on since you last looked")
            }
            ErrorKind::Conflict => err
                .with_context("another request changed the race at the same time")
                .with_suggestion("Retry the command"),
            ErrorKind::StorageFailure | ErrorKind::Internal => err
                .with_context(format!("daemon reported {}", kind))
                .with_suggestion("Check the daemon log (ergd.log in the state directory)"),
            ErrorKind::InvalidInput => err,
        }
    }

    /// Render a client failure for the terminal
    pub fn from_client(err: &ClientError, socket_path: &Path) -> Self {
        match err {
            ClientError::DaemonNotRunning => Self::daemon_not_running(socket_path),
            ClientError::Rejected { kind, message } => Self::rejected(*kind, message),
            ClientError::DaemonStartFailed(detail) => ErgError::new("failed to start daemon")
                .with_context(detail.clone())
                .with_suggestion("Check the daemon log (ergd.log in the state directory)"),
            other => ErgError::new(other.to_string()),
        }
    }
}

impl fmt::Display for ErgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for ErgError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
