// SPDX-License-Identifier: AGPL-3.0-or-later

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number identifying one commit point of the projection.
///
/// The number is the unix timestamp in nanoseconds of the event which opened
/// the commit's event group, so timeline numbers are strictly increasing in
/// insertion order. The zero timeline denotes "before the first commit";
/// readers and writers must only ever be called with positive numbers.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TimeLineNumber(pub i64);

impl TimeLineNumber {
    /// The timeline right before this one. Used by writers to close the
    /// previous version of a row.
    pub fn prev(self) -> TimeLineNumber {
        TimeLineNumber(self.0 - 1)
    }
}

impl fmt::Display for TimeLineNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the `timeline` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeLine {
    /// Unix timestamp in nanoseconds. Doubles as the timeline number.
    pub timestamp: i64,
}

impl TimeLine {
    pub fn number(&self) -> TimeLineNumber {
        TimeLineNumber(self.timestamp)
    }
}
