// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Race engine: shared state and read models
//!
//! The engine holds no race state of its own. Every operation reads from the
//! store, applies a pure transition, and writes back through a status-guarded
//! update while holding the per-race lock.

use crate::error::RaceError;
use erg_core::{Clock, Event, IdGen, Participant, Race, RaceConfig, RaceId};
use erg_storage::RaceStore;
use serde::{Deserialize, Serialize};

/// A race with its full roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub race: Race,
    /// Participants in join order
    pub participants: Vec<Participant>,
}

/// One race from a user's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceHistoryEntry {
    pub race: Race,
    /// The requesting user's own record
    pub entry: Participant,
    /// Ranked finishers first by position, then everyone else by join time
    pub participants: Vec<Participant>,
}

/// Coordinates race lifecycle, readiness and progress over a [`RaceStore`]
pub struct RaceEngine<S, C, I> {
    pub(crate) store: S,
    pub(crate) clock: C,
    pub(crate) id_gen: I,
    pub(crate) config: RaceConfig,
}

impl<S, C, I> RaceEngine<S, C, I>
where
    S: RaceStore,
    C: Clock,
    I: IdGen,
{
    pub fn new(store: S, clock: C, id_gen: I, config: RaceConfig) -> Self {
        Self {
            store,
            clock,
            id_gen,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    pub(crate) async fn require_race(&self, race_id: RaceId) -> Result<Race, RaceError> {
        self.store
            .race_by_id(race_id)
            .await?
            .ok_or(RaceError::RaceNotFound(race_id))
    }

    pub(crate) fn publish(&self, events: &[Event]) {
        for event in events {
            tracing::info!(event = event.name(), race_id = %event.race_id(), "{:?}", event);
        }
    }
}
