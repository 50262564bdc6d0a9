// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Race token generation
//!
//! Tokens are the opaque, shareable handle a user passes to friends so they
//! can join; the internal [`RaceId`](crate::RaceId) is assigned by the store.

use crate::race::RaceToken;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generates unique race tokens
pub trait IdGen: Clone + Send + Sync + 'static {
    fn next_token(&self) -> RaceToken;
}

/// UUID-based generator for production use
#[derive(Clone, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next_token(&self) -> RaceToken {
        RaceToken(uuid::Uuid::new_v4().to_string())
    }
}

/// Sequential generator for testing
#[derive(Clone)]
pub struct SequentialIdGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("race")
    }
}

impl IdGen for SequentialIdGen {
    fn next_token(&self) -> RaceToken {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        RaceToken(format!("{}-{}", self.prefix, n))
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
