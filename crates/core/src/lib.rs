// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! erg-core: domain model for live erg races
//!
//! This crate provides:
//! - Pure state machines for races and participants
//! - The result calculator (finishing position and pace)
//! - Events emitted by transitions and operations persisted to the WAL
//! - Clock and token generation abstractions for testable time and identity

pub mod clock;
pub mod config;
pub mod id;

// State machines (order matters for dependencies)
pub mod race;
pub mod participant;
pub mod progress;
pub mod event;
pub mod operation;
pub mod results;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, RaceConfig};
pub use event::Event;
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use operation::Operation;
pub use participant::{Participant, ParticipantError, ParticipantEvent, ParticipantStatus};
pub use progress::{ProgressUpdate, RaceFinish};
pub use race::{Race, RaceEvent, RaceId, RaceStatus, RaceToken, TransitionError, UserId};
pub use results::{compute_standings, Finisher, Pace, ResultError, Standing};
