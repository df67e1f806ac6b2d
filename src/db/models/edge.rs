// SPDX-License-Identifier: AGPL-3.0-or-later

use sqlx::any::AnyRow;
use sqlx::{FromRow, Row};

/// A vertex row joined with the anchor id of the edge it was reached over.
///
/// Used by the grouped neighbor queries: the engine selects the vertex
/// columns plus the edge's anchor endpoint aliased as `source_id` and groups
/// the results by it.
#[derive(Debug, Clone)]
pub(crate) struct Grouped<R> {
    pub row: R,
    pub source_id: String,
}

impl<'r, R> FromRow<'r, AnyRow> for Grouped<R>
where
    R: FromRow<'r, AnyRow>,
{
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Grouped {
            row: R::from_row(row)?,
            source_id: row.try_get("source_id")?,
        })
    }
}

/// A vertex row joined with the attribute columns of the `rolemember` edge
/// it was reached over, plus the anchor id.
#[derive(Debug, Clone)]
pub(crate) struct EdgeJoinRow<R> {
    pub row: R,
    pub focus: Option<String>,
    pub no_core_member: bool,
    pub election_expiration: Option<i64>,
    pub source_id: String,
}

impl<'r, R> FromRow<'r, AnyRow> for EdgeJoinRow<R>
where
    R: FromRow<'r, AnyRow>,
{
    fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
        Ok(EdgeJoinRow {
            row: R::from_row(row)?,
            focus: row.try_get("focus")?,
            no_core_member: row.try_get("nocoremember")?,
            election_expiration: row.try_get("electionexpiration")?,
            source_id: row.try_get("source_id")?,
        })
    }
}
