// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::Serialize;
use uuid::Uuid;

use crate::db::types::TimeLineNumber;

/// A tension vertex version, raised by a member and optionally targeting a
/// role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tension {
    pub id: Uuid,
    pub start_tl: TimeLineNumber,
    pub end_tl: Option<TimeLineNumber>,
    pub title: String,
    pub description: String,
    pub closed: bool,
    pub close_reason: String,
}
