// SPDX-License-Identifier: AGPL-3.0-or-later

use sqlx::FromRow;

use crate::db::models::parse_id;
use crate::db::types::{Member, MemberAvatar, TimeLineNumber};

/// Representation of a row from the `member` table as stored in the
/// database.
#[derive(FromRow, Debug, Clone)]
pub(crate) struct MemberRow {
    pub id: String,
    pub start_tl: i64,
    pub end_tl: Option<i64>,
    #[sqlx(rename = "isadmin")]
    pub is_admin: bool,
    #[sqlx(rename = "username")]
    pub user_name: String,
    #[sqlx(rename = "fullname")]
    pub full_name: String,
    pub email: String,
}

impl From<MemberRow> for Member {
    fn from(row: MemberRow) -> Member {
        Member {
            id: parse_id(&row.id),
            start_tl: TimeLineNumber(row.start_tl),
            end_tl: row.end_tl.map(TimeLineNumber),
            is_admin: row.is_admin,
            user_name: row.user_name,
            full_name: row.full_name,
            email: row.email,
        }
    }
}

/// Representation of a row from the `memberavatar` table. The row id equals
/// the member's id.
#[derive(FromRow, Debug, Clone)]
pub(crate) struct MemberAvatarRow {
    pub id: String,
    pub start_tl: i64,
    pub end_tl: Option<i64>,
    pub image: String,
}

impl From<MemberAvatarRow> for MemberAvatar {
    fn from(row: MemberAvatarRow) -> MemberAvatar {
        MemberAvatar {
            id: parse_id(&row.id),
            start_tl: TimeLineNumber(row.start_tl),
            end_tl: row.end_tl.map(TimeLineNumber),
            image: row.image,
        }
    }
}
