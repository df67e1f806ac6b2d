// SPDX-License-Identifier: AGPL-3.0-or-later

//! Structs representing rows in SQL tables. Needed when coercing results
//! returned from a query using the `sqlx` library.
mod edge;
mod member;
mod role;
mod role_event;
mod tension;

pub(crate) use edge::{EdgeJoinRow, Grouped};
pub(crate) use member::{MemberAvatarRow, MemberRow};
pub(crate) use role::{AccountabilityRow, DomainRow, RoleAdditionalContentRow, RoleRow};
pub(crate) use role_event::RoleEventRow;
pub(crate) use tension::TensionRow;

use uuid::Uuid;

/// Parse an id column value, panicking on corrupt database contents.
pub(crate) fn parse_id(value: &str) -> Uuid {
    value
        .parse()
        .unwrap_or_else(|_| panic!("Invalid id stored in database: {}", value))
}
