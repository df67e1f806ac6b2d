// SPDX-License-Identifier: AGPL-3.0-or-later

//! Queries against the `roleevent` table holding derived per-role records,
//! most prominently the per-commit `CircleChangesApplied` digests.
use sqlx::{query, query_as};
use uuid::Uuid;

use crate::db::errors::StoreError;
use crate::db::graph::GraphTx;
use crate::db::models::RoleEventRow;
use crate::db::types::{RoleEvent, RoleEventData, RoleEventType, TimeLineNumber};
use crate::db::MAX_FETCH_SIZE;

impl GraphTx<'_> {
    /// Paginated feed of a role's derived events, newest timeline first.
    /// `start` is an inclusive bound, `after` an exclusive one; `after`
    /// overrides when both are set.
    pub async fn role_events(
        &mut self,
        role_id: Uuid,
        first: Option<i64>,
        start: Option<TimeLineNumber>,
        after: Option<TimeLineNumber>,
    ) -> Result<(Vec<RoleEvent>, bool), StoreError> {
        let first = match first {
            Some(first) if first > 0 => first,
            _ => MAX_FETCH_SIZE,
        };

        let mut sql = String::from(
            "SELECT timeline, id, roleid, eventtype, data FROM roleevent WHERE roleid = $1",
        );
        match (start, after) {
            (_, Some(after)) => sql.push_str(&format!(" AND roleevent.timeline < {}", after.0)),
            (Some(start), None) => sql.push_str(&format!(" AND roleevent.timeline <= {}", start.0)),
            (None, None) => (),
        }
        // ask for first + 1 rows to know if there's more data
        sql.push_str(&format!(" ORDER BY timeline DESC LIMIT {}", first + 1));

        let rows: Vec<RoleEventRow> = query_as(&sql)
            .bind(role_id.to_string())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        let has_more = rows.len() as i64 > first;
        let events = rows
            .into_iter()
            .take(first as usize)
            .map(RoleEvent::from)
            .collect();

        Ok((events, has_more))
    }

    /// A role's derived events of one type at one timeline.
    pub async fn role_events_by_type(
        &mut self,
        role_id: Uuid,
        tl: TimeLineNumber,
        event_type: RoleEventType,
    ) -> Result<Vec<RoleEvent>, StoreError> {
        let rows: Vec<RoleEventRow> = query_as(
            "
            SELECT
                timeline,
                id,
                roleid,
                eventtype,
                data
            FROM
                roleevent
            WHERE
                roleid = $1
                AND timeline = $2
                AND eventtype = $3
            ",
        )
        .bind(role_id.to_string())
        .bind(tl.0)
        .bind(event_type.as_str())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| StoreError::Transaction(e.to_string()))?;

        Ok(rows.into_iter().map(RoleEvent::from).collect())
    }

    /// The `CircleChangesApplied` digest of a circle at one timeline, when
    /// the commit produced one.
    pub async fn circle_changes_applied_role_event(
        &mut self,
        tl: TimeLineNumber,
        role_id: Uuid,
    ) -> Result<Option<RoleEvent>, StoreError> {
        let mut role_events = self
            .role_events_by_type(role_id, tl, RoleEventType::CircleChangesApplied)
            .await?;

        if role_events.len() > 1 {
            panic!(
                "only max 1 event of kind CircleChangesApplied can exist for a role at a \
                 specific timeline"
            );
        }

        Ok(role_events.pop())
    }

    /// Insert or update a derived role event. The payload is an opaque JSON
    /// blob, so the whole row is replaced instead of mutated in place.
    pub(crate) async fn insert_role_event(
        &mut self,
        role_event: &RoleEvent,
    ) -> Result<(), StoreError> {
        let data = match &role_event.data {
            RoleEventData::CircleChangesApplied(data) => serde_json::to_string(data)
                .map_err(|e| StoreError::Transaction(e.to_string()))?,
        };

        // poor man's insert or update
        query("DELETE FROM roleevent WHERE id = $1")
            .bind(role_event.id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        query(
            "
            INSERT INTO
                roleevent (
                    timeline,
                    id,
                    roleid,
                    eventtype,
                    data
                )
            VALUES
                ($1, $2, $3, $4, $5)
            ",
        )
        .bind(role_event.time_line.0)
        .bind(role_event.id.to_string())
        .bind(role_event.role_id.to_string())
        .bind(role_event.event_type().as_str())
        .bind(data)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| StoreError::Transaction(e.to_string()))?;

        Ok(())
    }
}
