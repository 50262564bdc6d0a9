// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use erg_core::ParticipantStatus;
use yare::parameterized;

#[parameterized(
    too_short = { RaceError::DistanceTooShort { min: 100, got: 50 }, ErrorKind::InvalidInput },
    negative = { RaceError::InvalidDistance(-1), ErrorKind::InvalidInput },
    regressed = {
        RaceError::Participant(ParticipantError::DistanceRegressed { previous: 500, reported: 400 }),
        ErrorKind::InvalidInput
    },
    unknown_token = { RaceError::TokenNotFound(RaceToken::from("nope")), ErrorKind::NotFound },
    unknown_race = { RaceError::RaceNotFound(RaceId(3)), ErrorKind::NotFound },
    stranger = { RaceError::NotParticipant { race_id: RaceId(1), user_id: UserId(9) }, ErrorKind::NotFound },
    started = {
        RaceError::RaceAlreadyStarted { race_id: RaceId(1), status: RaceStatus::Active },
        ErrorKind::InvalidState
    },
    finished_participant = {
        RaceError::Participant(ParticipantError::Illegal {
            user_id: UserId(1),
            status: ParticipantStatus::Finished,
            action: "report progress",
        }),
        ErrorKind::InvalidState
    },
    conflict = { RaceError::Conflict(RaceId(1)), ErrorKind::Conflict },
    duplicate_token = { RaceError::Store(StoreError::DuplicateRace(RaceToken::from("t"))), ErrorKind::Conflict },
    unavailable = { RaceError::Store(StoreError::Unavailable("disk".into())), ErrorKind::StorageFailure },
    calculator = { RaceError::Results(ResultError::MissingStartTime), ErrorKind::Internal },
)]
fn error_kind_mapping(err: RaceError, kind: ErrorKind) {
    assert_eq!(err.kind(), kind);
}

#[test]
fn storage_detail_is_not_leaked() {
    let err = RaceError::Store(StoreError::Unavailable("/var/lib/erg: EIO".into()));
    let message = err.public_message();
    assert!(!message.contains("EIO"), "leaked: {}", message);
    assert!(!err.kind().is_client_error());
}

#[test]
fn client_errors_keep_their_message() {
    let err = RaceError::DistanceTooShort { min: 100, got: 50 };
    assert_eq!(
        err.public_message(),
        "race distance must be at least 100 meters, got 50"
    );
    assert!(err.kind().is_client_error());
}
