// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and request dispatch.

use std::time::{Duration, Instant};

use erg_core::{Clock, IdGen, RaceStatus};
use erg_engine::{ErrorKind, RaceEngine, RaceError};
use erg_storage::RaceStore;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Notify;
use tracing::{debug, error, warn};

use crate::protocol::{self, Query, Request, Response, PROTOCOL_VERSION};

/// State shared by every connection task
pub struct ServerContext<S, C, I> {
    pub engine: RaceEngine<S, C, I>,
    pub start_time: Instant,
    pub request_timeout: Duration,
    shutdown: Notify,
}

impl<S, C, I> ServerContext<S, C, I>
where
    S: RaceStore,
    C: Clock,
    I: IdGen,
{
    pub fn new(engine: RaceEngine<S, C, I>, request_timeout: Duration) -> Self {
        Self {
            engine,
            start_time: Instant::now(),
            request_timeout,
            shutdown: Notify::new(),
        }
    }

    pub fn request_shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Resolves once a client has asked the daemon to stop
    pub async fn shutdown_requested(&self) {
        self.shutdown.notified().await;
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("request timeout")]
    Timeout,
}

/// Handle a single client connection
pub async fn handle_connection<S, C, I, R, W>(
    ctx: &ServerContext<S, C, I>,
    mut reader: R,
    mut writer: W,
) -> Result<(), ServerError>
where
    S: RaceStore,
    C: Clock,
    I: IdGen,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let request = match protocol::read_request(&mut reader, ctx.request_timeout).await {
        Ok(req) => req,
        Err(protocol::ProtocolError::Timeout) => {
            warn!("request read timeout");
            return Err(ServerError::Timeout);
        }
        Err(protocol::ProtocolError::ConnectionClosed) => {
            debug!("client disconnected before sending request");
            return Ok(());
        }
        Err(protocol::ProtocolError::Json(e)) => {
            // Malformed body still gets a typed reply
            let response = Response::Error {
                kind: ErrorKind::InvalidInput,
                message: format!("malformed request: {}", e),
            };
            protocol::write_response(&mut writer, &response, ctx.request_timeout).await?;
            return Ok(());
        }
        Err(e) => return Err(ServerError::Protocol(e)),
    };

    debug!(?request, "received request");

    let response = handle_request(ctx, request).await;

    debug!(?response, "sending response");

    protocol::write_response(&mut writer, &response, ctx.request_timeout).await?;
    Ok(())
}

/// Handle a single request and return a response
pub async fn handle_request<S, C, I>(ctx: &ServerContext<S, C, I>, request: Request) -> Response
where
    S: RaceStore,
    C: Clock,
    I: IdGen,
{
    let engine = &ctx.engine;
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version } => {
            if version != PROTOCOL_VERSION {
                warn!(client = %version, daemon = PROTOCOL_VERSION, "protocol version mismatch");
            }
            Response::Hello {
                version: PROTOCOL_VERSION.to_string(),
            }
        }

        Request::Status => status(ctx).await,

        Request::Shutdown => {
            ctx.request_shutdown();
            Response::ShuttingDown
        }

        Request::CreateRace { user_id, distance } => {
            respond(engine.create_race(user_id, distance).await, |race| {
                Response::RaceCreated { race }
            })
        }

        Request::JoinRace { token, user_id } => {
            respond(engine.join_race(&token, user_id).await, |()| Response::Ok)
        }

        Request::SetReady {
            race_id,
            user_id,
            ready,
        } => {
            if let Err(e) = engine.set_ready(race_id, user_id, ready).await {
                return error_response(e);
            }
            if !ready {
                return Response::Countdown { scheduled: false };
            }
            respond(engine.evaluate_countdown(race_id).await, |scheduled| {
                Response::Countdown { scheduled }
            })
        }

        Request::EvaluateCountdown { race_id } => {
            respond(engine.evaluate_countdown(race_id).await, |scheduled| {
                Response::Countdown { scheduled }
            })
        }

        Request::StartRace { race_id } => {
            respond(engine.transition_to_active(race_id).await, |()| Response::Ok)
        }

        Request::ReportProgress {
            race_id,
            user_id,
            distance,
        } => respond(
            engine.report_progress(race_id, user_id, distance).await,
            |()| Response::Ok,
        ),

        Request::Query { query } => handle_query(ctx, query).await,
    }
}

async fn handle_query<S, C, I>(ctx: &ServerContext<S, C, I>, query: Query) -> Response
where
    S: RaceStore,
    C: Clock,
    I: IdGen,
{
    let engine = &ctx.engine;
    match query {
        Query::GetRace { token } => respond(engine.get_race(&token).await, |snapshot| {
            Response::Race { snapshot }
        }),
        Query::GetRaceById { race_id } => {
            respond(engine.get_race_by_id(race_id).await, |snapshot| {
                Response::Race { snapshot }
            })
        }
        Query::RaceHistory { user_id } => {
            respond(engine.race_history(user_id).await, |races| {
                Response::History { races }
            })
        }
        Query::ProgressLog { race_id } => {
            respond(engine.progress_log(race_id).await, |updates| {
                Response::Progress { updates }
            })
        }
    }
}

async fn status<S, C, I>(ctx: &ServerContext<S, C, I>) -> Response
where
    S: RaceStore,
    C: Clock,
    I: IdGen,
{
    let store = ctx.engine.store();
    let counts = async {
        Ok::<_, erg_storage::StoreError>((
            store.races_in_status(RaceStatus::Waiting).await?.len(),
            store.races_in_status(RaceStatus::Countdown).await?.len(),
            store.races_in_status(RaceStatus::Active).await?.len(),
        ))
    };

    match counts.await {
        Ok((races_waiting, races_countdown, races_active)) => Response::Status {
            uptime_secs: ctx.start_time.elapsed().as_secs(),
            races_waiting,
            races_countdown,
            races_active,
        },
        Err(e) => error_response(RaceError::from(e)),
    }
}

fn respond<T>(result: Result<T, RaceError>, ok: impl FnOnce(T) -> Response) -> Response {
    match result {
        Ok(value) => ok(value),
        Err(e) => error_response(e),
    }
}

/// Map an engine failure to a client-safe response
fn error_response(e: RaceError) -> Response {
    let kind = e.kind();
    if kind.is_client_error() {
        debug!(error = %e, %kind, "request rejected");
    } else {
        error!(error = %e, %kind, "request failed");
    }
    Response::Error {
        kind,
        message: e.public_message(),
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
