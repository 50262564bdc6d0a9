// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Race commands: create, join, ready, start, progress and lookups

use anyhow::Result;
use clap::Args;
use erg_core::{RaceId, RaceToken, UserId};

use crate::client::DaemonClient;
use crate::output::{self, CreatedView, HistoryView, OutputFormat, ProgressView, RaceView};

#[derive(Args)]
pub struct CreateArgs {
    /// Target distance in meters
    #[arg(long, allow_negative_numbers = true)]
    pub distance: i64,
}

#[derive(Args)]
pub struct JoinArgs {
    /// Token shared by the race creator
    pub token: String,
}

#[derive(Args)]
pub struct ReadyArgs {
    pub race_id: u64,
    /// Mark yourself not ready instead
    #[arg(long)]
    pub not: bool,
}

#[derive(Args)]
pub struct StartArgs {
    pub race_id: u64,
}

#[derive(Args)]
pub struct ProgressArgs {
    pub race_id: u64,
    /// Total meters rowed so far
    #[arg(long, allow_negative_numbers = true)]
    pub distance: i64,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Race token
    #[arg(required_unless_present = "id")]
    pub token: Option<String>,
    /// Look up by internal race id instead
    #[arg(long, conflicts_with = "token")]
    pub id: Option<u64>,
}

#[derive(Args)]
pub struct LogArgs {
    pub race_id: u64,
}

pub async fn create(
    client: &DaemonClient,
    user: UserId,
    args: CreateArgs,
    format: OutputFormat,
) -> Result<()> {
    let race = client.create_race(user, args.distance).await?;
    output::print(&CreatedView(&race), format);
    Ok(())
}

pub async fn join(client: &DaemonClient, user: UserId, args: JoinArgs) -> Result<()> {
    let token = RaceToken::from(args.token);
    client.join_race(token.clone(), user).await?;
    println!("Joined race {}", token);
    Ok(())
}

pub async fn ready(client: &DaemonClient, user: UserId, args: ReadyArgs) -> Result<()> {
    let race_id = RaceId(args.race_id);
    let scheduled = client.set_ready(race_id, user, !args.not).await?;
    if args.not {
        println!("Marked not ready for race {}", race_id);
    } else if scheduled {
        println!("Everyone is ready: race {} is counting down", race_id);
    } else {
        println!("Marked ready for race {}", race_id);
    }
    Ok(())
}

pub async fn start(client: &DaemonClient, args: StartArgs) -> Result<()> {
    let race_id = RaceId(args.race_id);
    client.start_race(race_id).await?;
    println!("Race {} is active", race_id);
    Ok(())
}

pub async fn progress(client: &DaemonClient, user: UserId, args: ProgressArgs) -> Result<()> {
    let race_id = RaceId(args.race_id);
    client.report_progress(race_id, user, args.distance).await?;
    println!("Recorded {}m in race {}", args.distance, race_id);
    Ok(())
}

pub async fn show(client: &DaemonClient, args: ShowArgs, format: OutputFormat) -> Result<()> {
    let snapshot = match (args.id, args.token) {
        (Some(id), _) => client.get_race_by_id(RaceId(id)).await?,
        (None, Some(token)) => client.get_race(RaceToken::from(token)).await?,
        (None, None) => anyhow::bail!("a race token or --id is required"),
    };
    output::print(&RaceView(&snapshot), format);
    Ok(())
}

pub async fn history(client: &DaemonClient, user: UserId, format: OutputFormat) -> Result<()> {
    let races = client.race_history(user).await?;
    let views: Vec<HistoryView<'_>> = races.iter().map(HistoryView).collect();
    output::print_list(&views, format, "No races");
    Ok(())
}

pub async fn log(client: &DaemonClient, args: LogArgs, format: OutputFormat) -> Result<()> {
    let updates = client.progress_log(RaceId(args.race_id)).await?;
    let views: Vec<ProgressView<'_>> = updates.iter().map(ProgressView).collect();
    output::print_list(&views, format, "No progress reported");
    Ok(())
}
