// SPDX-License-Identifier: AGPL-3.0-or-later

use sqlx::FromRow;

use crate::db::models::parse_id;
use crate::db::types::{Tension, TimeLineNumber};

/// Representation of a row from the `tension` table as stored in the
/// database.
#[derive(FromRow, Debug, Clone)]
pub(crate) struct TensionRow {
    pub id: String,
    pub start_tl: i64,
    pub end_tl: Option<i64>,
    pub title: String,
    pub description: String,
    pub closed: bool,
    #[sqlx(rename = "closereason")]
    pub close_reason: String,
}

impl From<TensionRow> for Tension {
    fn from(row: TensionRow) -> Tension {
        Tension {
            id: parse_id(&row.id),
            start_tl: TimeLineNumber(row.start_tl),
            end_tl: row.end_tl.map(TimeLineNumber),
            title: row.title,
            description: row.description,
            closed: row.closed,
            close_reason: row.close_reason,
        }
    }
}
