// SPDX-License-Identifier: AGPL-3.0-or-later

//! # corolla
//!
//! Read-side projection and query engine for an event-sourced
//! organizational-governance application. `corolla` consumes an ordered log
//! of domain events and maintains a bitemporal graph of roles, domains,
//! accountabilities, members and tensions which can be queried at any past
//! timeline.
#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_import_braces,
    unused_qualifications
)]

mod config;
mod context;
mod db;
mod events;
mod materializer;
mod password;

pub use config::Configuration;
pub use context::RequestContext;
pub use db::errors::{AuthError, StoreError};
pub use db::graph::{Direction, GraphTx};
pub use db::schema::{EdgeClass, VertexClass};
pub use db::types::*;
pub use db::{connection_pool, create_database, Pool, SqlStore, MAX_FETCH_SIZE};
pub use events::{Command, CommandData, Event, EventData};
pub use materializer::{apply_event, apply_events};
pub use password::{Blake3Verifier, PasswordError, PasswordVerifier};

/// Init pretty_env_logger before the test suite runs to handle logging
/// outputs.
///
/// Some of our dependencies (`sqlx` for example) emit log messages which we
/// can handle and print using `pretty_env_logger`. Logging behaviour can be
/// customised at runtime with eg. `RUST_LOG=sqlx=debug cargo t`.
///
/// The `ctor` crate is used to define a global constructor function. This
/// method will be run before any of the test suites.
#[cfg(test)]
#[ctor::ctor]
fn init() {
    // If the `RUST_LOG` env var is not set skip initiation as we don't want
    // to see any logs.
    if std::env::var("RUST_LOG").is_ok() {
        pretty_env_logger::init();
    }
}
