// SPDX-License-Identifier: AGPL-3.0-or-later

//! Persistent storage of the projection supporting both Postgres and SQLite
//! databases.
//!
//! The main interface is [`SqlStore`] which hands out transaction-bound
//! [`GraphTx`](crate::db::graph::GraphTx) instances; all reads and writes of
//! the projection happen through one of those.
use anyhow::{Error, Result};
use sqlx::any::{Any, AnyPool, AnyPoolOptions};
use sqlx::migrate::MigrateDatabase;

use crate::db::errors::StoreError;
use crate::db::graph::GraphTx;

pub mod errors;
pub mod graph;
pub mod models;
pub mod schema;
pub mod stores;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

/// Default page size of all list queries.
pub const MAX_FETCH_SIZE: i64 = 25;

/// Re-export of generic connection pool type.
pub type Pool = AnyPool;

/// SQL based persistent storage holding the projected bitemporal graph.
#[derive(Clone, Debug)]
pub struct SqlStore {
    pub(crate) pool: Pool,
}

impl SqlStore {
    /// Create a new `SqlStore` using the provided db `Pool`.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Begin the ambient transaction and bind a projection instance to it.
    ///
    /// The returned [`GraphTx`] caches the current timeline; the cache stays
    /// valid for the whole transaction since only this transaction may
    /// advance it.
    pub async fn begin(&self) -> Result<GraphTx<'_>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        // Zeroed timeline, also valid if there are no rows yet
        let cur_tl = stores::timeline::current_time_line(&mut tx)
            .await?
            .unwrap_or_default();

        Ok(GraphTx::new(tx, cur_tl))
    }
}

/// Create database when not existing.
pub async fn create_database(url: &str) -> Result<()> {
    if !Any::database_exists(url).await? {
        Any::create_database(url).await?;
    }

    Ok(())
}

/// Create a database agnostic connection pool.
pub async fn connection_pool(url: &str, max_connections: u32) -> Result<Pool, Error> {
    let pool: Pool = AnyPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await?;

    Ok(pool)
}
