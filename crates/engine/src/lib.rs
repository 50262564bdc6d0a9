// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Erg race coordination engine

mod engine;
mod error;
mod lifecycle;
mod progress;
mod readiness;

pub use engine::{RaceEngine, RaceHistoryEntry, RaceSnapshot};
pub use error::{ErrorKind, RaceError};

#[cfg(test)]
#[path = "test_helpers.rs"]
mod test_helpers;
