// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine unit tests

use crate::RaceEngine;
use erg_core::{FakeClock, Race, RaceConfig, RaceId, SequentialIdGen, UserId};
use erg_storage::FakeStore;
use std::time::Duration;

pub(crate) type TestEngine = RaceEngine<FakeStore, FakeClock, SequentialIdGen>;

pub(crate) fn engine() -> TestEngine {
    RaceEngine::new(
        FakeStore::new(),
        FakeClock::new(),
        SequentialIdGen::default(),
        RaceConfig::default(),
    )
}

/// Race of `distance` created by `users[0]` and joined by the rest
pub(crate) async fn race_with(engine: &TestEngine, distance: i64, users: &[u64]) -> Race {
    let race = engine.create_race(UserId(users[0]), distance).await.unwrap();
    for user in &users[1..] {
        engine.join_race(&race.token, UserId(*user)).await.unwrap();
    }
    race
}

pub(crate) async fn ready_all(engine: &TestEngine, race_id: RaceId, users: &[u64]) {
    for user in users {
        engine.set_ready(race_id, UserId(*user), true).await.unwrap();
    }
}

/// Race that has gone through countdown and is now active
pub(crate) async fn active_race(engine: &TestEngine, distance: i64, users: &[u64]) -> Race {
    let race = race_with(engine, distance, users).await;
    ready_all(engine, race.id, users).await;
    assert!(engine.evaluate_countdown(race.id).await.unwrap());
    engine.clock().advance(Duration::from_secs(10));
    engine.transition_to_active(race.id).await.unwrap();
    engine.get_race_by_id(race.id).await.unwrap().race
}
