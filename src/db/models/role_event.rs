// SPDX-License-Identifier: AGPL-3.0-or-later

use sqlx::FromRow;

use crate::db::models::parse_id;
use crate::db::types::{
    RoleEvent, RoleEventCircleChangesApplied, RoleEventData, RoleEventType, TimeLineNumber,
};

/// Representation of a row from the `roleevent` table. The payload is
/// persisted as a JSON blob whose shape depends on the event type.
#[derive(FromRow, Debug, Clone)]
pub(crate) struct RoleEventRow {
    #[sqlx(rename = "timeline")]
    pub time_line: i64,
    pub id: String,
    #[sqlx(rename = "roleid")]
    pub role_id: String,
    #[sqlx(rename = "eventtype")]
    pub event_type: String,
    pub data: String,
}

impl From<RoleEventRow> for RoleEvent {
    fn from(row: RoleEventRow) -> RoleEvent {
        let event_type = RoleEventType::parse(&row.event_type).unwrap_or_else(|| {
            panic!(
                "Invalid role event type stored in database: {}",
                row.event_type
            )
        });

        let data = match event_type {
            RoleEventType::CircleChangesApplied => {
                let data: RoleEventCircleChangesApplied = serde_json::from_str(&row.data)
                    .unwrap_or_else(|e| panic!("Invalid role event data stored in database: {}", e));
                RoleEventData::CircleChangesApplied(data)
            }
        };

        RoleEvent {
            id: parse_id(&row.id),
            time_line: TimeLineNumber(row.time_line),
            role_id: parse_id(&row.role_id),
            data,
        }
    }
}
