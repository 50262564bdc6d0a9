// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! erg-daemon: host process for the race engine
//!
//! The `ergd` binary owns the race journal and serves requests over a Unix
//! socket. This library exposes the wire protocol and configuration so the
//! `erg` CLI speaks the same language.

pub mod config;
pub mod lifecycle;
pub mod protocol;
pub mod server;

pub use config::Config;
pub use protocol::{
    decode, encode, read_message, write_message, ProtocolError, Query, Request, Response,
    DEFAULT_TIMEOUT, PROTOCOL_VERSION,
};
