// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::{FakeStore, JournalStore};
use erg_core::FakeClock;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::default();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

fn fixture(token: &str) -> (Race, Participant) {
    let clock = FakeClock::new();
    let race = Race::new(RaceId(1), RaceToken::from(token), 2000, UserId(7), &clock);
    let creator = Participant::new(RaceId(1), UserId(7), &clock);
    (race, creator)
}

#[test]
fn insert_race_logs_span_with_token() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedStore::new(JournalStore::in_memory());
        let (race, creator) = fixture("tok-abc");
        traced.insert_race(&race, &creator).await
    });

    assert!(result.is_ok(), "insert should succeed: {:?}", result);
    assert!(logs.contains("store.insert_race"), "Logs:\n{}", logs);
    assert!(logs.contains("tok-abc"), "Logs:\n{}", logs);
    assert!(logs.contains("committed"), "Logs:\n{}", logs);
}

#[test]
fn lost_status_guard_is_logged() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedStore::new(JournalStore::in_memory());
        let (race, creator) = fixture("tok");
        traced.insert_race(&race, &creator).await.unwrap();
        let mut next = race.clone();
        next.status = RaceStatus::Countdown;
        traced.update_race(RaceStatus::Waiting, &next).await.unwrap();
        traced.update_race(RaceStatus::Waiting, &next).await
    });

    assert!(matches!(result, Ok(false)));
    assert!(
        logs.contains("status guard lost"),
        "Should note the lost CAS. Logs:\n{}",
        logs
    );
}

#[test]
fn failed_write_logs_error() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeStore::new();
        fake.set_fail_writes(true);
        let traced = TracedStore::new(fake);
        let (race, creator) = fixture("tok");
        traced.insert_race(&race, &creator).await
    });

    assert!(result.is_err());
    assert!(logs.contains("ERROR"), "Logs:\n{}", logs);
    assert!(logs.contains("injected write failure"), "Logs:\n{}", logs);
}

#[tokio::test]
async fn traced_store_passes_reads_through() {
    let traced = TracedStore::new(JournalStore::in_memory());
    let (race, creator) = fixture("tok");
    traced.insert_race(&race, &creator).await.unwrap();

    let found = traced.race_by_token(&RaceToken::from("tok")).await.unwrap();
    assert_eq!(found, Some(race.clone()));
    assert_eq!(traced.participants(race.id).await.unwrap(), vec![creator]);
    assert!(traced.inner().with_state(|s| s.races.len()) == 1);
}

#[test]
fn finishing_report_logs_results() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedStore::new(JournalStore::in_memory());
        let (race, creator) = fixture("tok");
        traced.insert_race(&race, &creator).await.unwrap();

        let mut active = race.clone();
        active.status = RaceStatus::Active;
        traced.update_race(RaceStatus::Waiting, &active).await.unwrap();
        let mut racing = creator.clone();
        racing.status = ParticipantStatus::Racing;
        traced
            .update_participant(ParticipantStatus::NotReady, &racing)
            .await
            .unwrap();

        let mut finished = racing.clone();
        finished.status = ParticipantStatus::Finished;
        finished.distance = 2000;
        let mut done = active.clone();
        done.status = RaceStatus::Finished;
        let finish = RaceFinish {
            race: done,
            standings: vec![erg_core::Standing {
                user_id: UserId(7),
                position: 1,
                pace: erg_core::Pace(150_000),
                elapsed_ms: 600_000,
            }],
        };
        let update = ProgressUpdate {
            race_id: race.id,
            user_id: UserId(7),
            distance: 2000,
            timestamp: race.created_at,
        };
        traced
            .record_progress(&update, ParticipantStatus::Racing, &finished, Some(&finish))
            .await
    });

    assert!(matches!(result, Ok(true)));
    assert!(logs.contains("store.record_progress"), "Logs:\n{}", logs);
    assert!(logs.contains("race results recorded"), "Logs:\n{}", logs);
}
