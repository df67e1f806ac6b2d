// SPDX-License-Identifier: AGPL-3.0-or-later

use thiserror::Error;

use crate::password::PasswordError;

/// Errors surfaced by the temporal graph engine and the read API.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A query failed inside the ambient transaction. The caller is expected
    /// to abort the transaction.
    #[error("SQL query failed: {0}")]
    Transaction(String),

    /// A state the schema forbids was observed, e.g. more than one root
    /// role. Fatal at the call site.
    #[error("invariant violated: {0}")]
    InvariantViolated(String),

    /// `check_broken_edges` found an edge with a dangling endpoint.
    #[error(
        "there are {broken} ({edges} edges, {vertices} vertices) broken edges at timeline {tl} \
         on edge.{edge_point} {edge_class} -> vertex {vertex_class}"
    )]
    BrokenEdges {
        broken: i64,
        edges: i64,
        vertices: i64,
        tl: i64,
        edge_point: &'static str,
        edge_class: &'static str,
        vertex_class: &'static str,
    },
}

/// Errors surfaced by authentication and calling-member resolution.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("no such member")]
    NoSuchMember,

    #[error("invalid password")]
    InvalidPassword,

    /// The ambient request context carries no user id.
    #[error("empty userid")]
    MissingUserId,

    #[error("invalid userid: {0}")]
    InvalidUserId(String),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
