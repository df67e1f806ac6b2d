// SPDX-License-Identifier: AGPL-3.0-or-later

//! Queries against the `timeline` table. Each row is one commit point of
//! the projection; its timestamp doubles as the timeline number.
use sqlx::any::Any;
use sqlx::{query, query_scalar, Transaction};
use uuid::Uuid;

use crate::db::errors::StoreError;
use crate::db::graph::GraphTx;
use crate::db::types::{TimeLine, TimeLineNumber};
use crate::db::MAX_FETCH_SIZE;

/// Read the newest timeline row, `None` when the table is empty.
pub(crate) async fn current_time_line(
    tx: &mut Transaction<'_, Any>,
) -> Result<Option<TimeLine>, StoreError> {
    let timestamp: Option<i64> =
        query_scalar("SELECT timestamp FROM timeline ORDER BY timestamp DESC LIMIT 1")
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

    Ok(timestamp.map(|timestamp| TimeLine { timestamp }))
}

impl GraphTx<'_> {
    /// The cached current timeline; the zero timeline when no event group
    /// was applied yet.
    pub fn cur_time_line(&self) -> TimeLine {
        self.cur_tl
    }

    /// Re-read the current timeline from the store, so reads after a write
    /// see the writer's own commit point.
    pub(crate) async fn refresh_cur_time_line(&mut self) -> Result<(), StoreError> {
        self.cur_tl = current_time_line(&mut self.tx).await?.unwrap_or_default();
        Ok(())
    }

    /// Look a timeline up by its number.
    pub async fn time_line(&mut self, tl: TimeLineNumber) -> Result<Option<TimeLine>, StoreError> {
        let timestamp: Option<i64> =
            query_scalar("SELECT timestamp FROM timeline WHERE timestamp = $1")
                .bind(tl.0)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(|e| StoreError::Transaction(e.to_string()))?;

        Ok(timestamp.map(|timestamp| TimeLine { timestamp }))
    }

    /// Look the timeline of an event group up.
    pub async fn time_line_for_group_id(
        &mut self,
        group_id: Uuid,
    ) -> Result<Option<TimeLine>, StoreError> {
        let timestamp: Option<i64> =
            query_scalar("SELECT timestamp FROM timeline WHERE groupid = $1")
                .bind(group_id.to_string())
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(|e| StoreError::Transaction(e.to_string()))?;

        Ok(timestamp.map(|timestamp| TimeLine { timestamp }))
    }

    /// The first timeline at or after the provided timestamp.
    pub async fn time_line_at_timestamp(
        &mut self,
        timestamp: i64,
    ) -> Result<Option<TimeLine>, StoreError> {
        let timestamp: Option<i64> = query_scalar(
            "SELECT timestamp FROM timeline WHERE timestamp >= $1 ORDER BY timestamp ASC LIMIT 1",
        )
        .bind(timestamp)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| StoreError::Transaction(e.to_string()))?;

        Ok(timestamp.map(|timestamp| TimeLine { timestamp }))
    }

    /// Paginated timeline history around a point, newest first when walking
    /// backwards (`after == false`), oldest first when walking forwards.
    /// Optionally restricted to the aggregate which opened each group.
    pub async fn time_lines(
        &mut self,
        timestamp: Option<i64>,
        tl: TimeLineNumber,
        limit: i64,
        after: bool,
        aggregate_type: Option<&str>,
        aggregate_id: Option<Uuid>,
    ) -> Result<(Vec<TimeLine>, bool), StoreError> {
        let limit = if limit <= 0 { MAX_FETCH_SIZE } else { limit };
        let timestamp = timestamp.unwrap_or(tl.0);

        let mut sql = String::from("SELECT timestamp FROM timeline WHERE ");
        if after {
            sql.push_str("timestamp > $1");
        } else {
            sql.push_str("timestamp < $1");
        }

        let mut binds: Vec<String> = Vec::new();
        if let Some(aggregate_type) = aggregate_type {
            binds.push(aggregate_type.to_owned());
            sql.push_str(&format!(" AND aggregatetype = ${}", binds.len() + 1));
        }
        if let Some(aggregate_id) = aggregate_id {
            binds.push(aggregate_id.to_string());
            sql.push_str(&format!(" AND aggregateid = ${}", binds.len() + 1));
        }

        if after {
            sql.push_str(" ORDER BY timestamp ASC");
        } else {
            sql.push_str(" ORDER BY timestamp DESC");
        }
        // ask for limit + 1 rows to know if there's more data
        sql.push_str(&format!(" LIMIT {}", limit + 1));

        let mut query = query_scalar::<_, i64>(&sql).bind(timestamp);
        for bind in binds {
            query = query.bind(bind);
        }

        let timestamps = query
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        let has_more = timestamps.len() as i64 > limit;
        let time_lines = timestamps
            .into_iter()
            .take(limit as usize)
            .map(|timestamp| TimeLine { timestamp })
            .collect();

        Ok((time_lines, has_more))
    }

    /// Record the commit point of a new event group.
    pub(crate) async fn insert_time_line(
        &mut self,
        timestamp: i64,
        group_id: Uuid,
        aggregate_type: &str,
        aggregate_id: Uuid,
    ) -> Result<(), StoreError> {
        query(
            "
            INSERT INTO
                timeline (
                    timestamp,
                    groupid,
                    aggregatetype,
                    aggregateid
                )
            VALUES
                ($1, $2, $3, $4)
            ",
        )
        .bind(timestamp)
        .bind(group_id.to_string())
        .bind(aggregate_type)
        .bind(aggregate_id.to_string())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| StoreError::Transaction(e.to_string()))?;

        Ok(())
    }
}
