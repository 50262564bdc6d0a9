// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Race storage: data-access contract, write-ahead log and journal-backed store

mod journal;
mod state;
mod store;
mod traced;
mod wal;

pub use journal::JournalStore;
pub use state::MaterializedState;
pub use store::{RaceLock, RaceStore, StoreError};
pub use traced::TracedStore;
pub use wal::{Wal, WalError};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeStore, StoreCall, WriteKind};
