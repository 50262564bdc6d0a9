// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use std::fmt;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use erg_core::{Participant, ProgressUpdate, Race};
use erg_engine::{RaceHistoryEntry, RaceSnapshot};
use serde::Serialize;

use crate::client::DaemonStatus;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Print output in the specified format
pub fn print<T: Serialize + fmt::Display>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(value) {
                println!("{}", json);
            }
        }
    }
}

/// Print a list of items
pub fn print_list<T: Serialize + fmt::Display>(items: &[T], format: OutputFormat, empty: &str) {
    match format {
        OutputFormat::Text => {
            if items.is_empty() {
                println!("{}", empty);
            }
            for item in items {
                println!("{}", item);
            }
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(items) {
                println!("{}", json);
            }
        }
    }
}

fn time(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "-".to_string(), |t| t.format("%H:%M:%S").to_string())
}

fn opt<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn race_header(f: &mut fmt::Formatter<'_>, race: &Race) -> fmt::Result {
    writeln!(f, "Race {} ({})", race.id, race.token)?;
    writeln!(f, "  Status: {}", race.status)?;
    writeln!(f, "  Distance: {}m", race.distance)?;
    if race.countdown_at.is_some() {
        writeln!(f, "  Countdown ends: {}", time(race.countdown_at))?;
    }
    if race.started_at.is_some() {
        writeln!(f, "  Started: {}", time(race.started_at))?;
    }
    if race.finished_at.is_some() {
        writeln!(f, "  Finished: {}", time(race.finished_at))?;
    }
    Ok(())
}

fn roster(f: &mut fmt::Formatter<'_>, participants: &[Participant]) -> fmt::Result {
    write!(
        f,
        "  {:<10} {:<10} {:>8} {:>4} {:>6}",
        "USER", "STATUS", "DISTANCE", "POS", "PACE"
    )?;
    for p in participants {
        write!(
            f,
            "\n  {:<10} {:<10} {:>8} {:>4} {:>6}",
            p.user_id.to_string(),
            p.status.to_string(),
            p.distance,
            opt(p.position),
            opt(p.pace)
        )?;
    }
    Ok(())
}

/// A race with its roster
#[derive(Serialize)]
#[serde(transparent)]
pub struct RaceView<'a>(pub &'a RaceSnapshot);

impl fmt::Display for RaceView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        race_header(f, &self.0.race)?;
        roster(f, &self.0.participants)
    }
}

/// Freshly created race, with the token to share
#[derive(Serialize)]
#[serde(transparent)]
pub struct CreatedView<'a>(pub &'a Race);

impl fmt::Display for CreatedView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Created race {} ({}m)", self.0.id, self.0.distance)?;
        write!(f, "  Join token: {}", self.0.token)
    }
}

/// One line per past race
#[derive(Serialize)]
#[serde(transparent)]
pub struct HistoryView<'a>(pub &'a RaceHistoryEntry);

impl fmt::Display for HistoryView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let HistoryView(entry) = self;
        write!(
            f,
            "{:<6} {:<10} {:>6}m  {}  you: {} {}m pos {} pace {} ({} rowers)",
            entry.race.id.to_string(),
            entry.race.status.to_string(),
            entry.race.distance,
            entry.race.created_at.format("%Y-%m-%d %H:%M"),
            entry.entry.status,
            entry.entry.distance,
            opt(entry.entry.position),
            opt(entry.entry.pace),
            entry.participants.len()
        )
    }
}

#[derive(Serialize)]
#[serde(transparent)]
pub struct ProgressView<'a>(pub &'a ProgressUpdate);

impl fmt::Display for ProgressView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  user {:<8} {:>6}m",
            self.0.timestamp.format("%H:%M:%S%.3f"),
            self.0.user_id.to_string(),
            self.0.distance
        )
    }
}

impl fmt::Display for DaemonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Daemon running (uptime {}s)", self.uptime_secs)?;
        writeln!(f, "  Waiting: {}", self.races_waiting)?;
        writeln!(f, "  Counting down: {}", self.races_countdown)?;
        write!(f, "  Active: {}", self.races_active)
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
