// SPDX-License-Identifier: AGPL-3.0-or-later

use sqlx::FromRow;

use crate::db::models::parse_id;
use crate::db::types::{
    Accountability, Domain, Role, RoleAdditionalContent, RoleType, TimeLineNumber,
};

/// Representation of a row from the `role` table as stored in the database.
#[derive(FromRow, Debug, Clone)]
pub(crate) struct RoleRow {
    pub id: String,
    pub start_tl: i64,
    pub end_tl: Option<i64>,
    #[sqlx(rename = "roletype")]
    pub role_type: String,
    pub depth: i64,
    pub name: String,
    pub purpose: String,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Role {
        Role {
            id: parse_id(&row.id),
            start_tl: TimeLineNumber(row.start_tl),
            end_tl: row.end_tl.map(TimeLineNumber),
            role_type: RoleType::parse(&row.role_type).unwrap_or_else(|| {
                panic!("Invalid role type stored in database: {}", row.role_type)
            }),
            depth: row.depth,
            name: row.name,
            purpose: row.purpose,
        }
    }
}

/// Representation of a row from the `domain` table.
#[derive(FromRow, Debug, Clone)]
pub(crate) struct DomainRow {
    pub id: String,
    pub start_tl: i64,
    pub end_tl: Option<i64>,
    pub description: String,
}

impl From<DomainRow> for Domain {
    fn from(row: DomainRow) -> Domain {
        Domain {
            id: parse_id(&row.id),
            start_tl: TimeLineNumber(row.start_tl),
            end_tl: row.end_tl.map(TimeLineNumber),
            description: row.description,
        }
    }
}

/// Representation of a row from the `accountability` table.
#[derive(FromRow, Debug, Clone)]
pub(crate) struct AccountabilityRow {
    pub id: String,
    pub start_tl: i64,
    pub end_tl: Option<i64>,
    pub description: String,
}

impl From<AccountabilityRow> for Accountability {
    fn from(row: AccountabilityRow) -> Accountability {
        Accountability {
            id: parse_id(&row.id),
            start_tl: TimeLineNumber(row.start_tl),
            end_tl: row.end_tl.map(TimeLineNumber),
            description: row.description,
        }
    }
}

/// Representation of a row from the `roleadditionalcontent` table. The row
/// id equals the role's id.
#[derive(FromRow, Debug, Clone)]
pub(crate) struct RoleAdditionalContentRow {
    pub id: String,
    pub start_tl: i64,
    pub end_tl: Option<i64>,
    pub content: String,
}

impl From<RoleAdditionalContentRow> for RoleAdditionalContent {
    fn from(row: RoleAdditionalContentRow) -> RoleAdditionalContent {
        RoleAdditionalContent {
            id: parse_id(&row.id),
            start_tl: TimeLineNumber(row.start_tl),
            end_tl: row.end_tl.map(TimeLineNumber),
            content: row.content,
        }
    }
}
