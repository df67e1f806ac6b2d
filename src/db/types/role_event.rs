// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::types::TimeLineNumber;

/// Kind of a derived role event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleEventType {
    CircleChangesApplied,
}

impl RoleEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleEventType::CircleChangesApplied => "CircleChangesApplied",
        }
    }

    pub fn parse(value: &str) -> Option<RoleEventType> {
        match value {
            "CircleChangesApplied" => Some(RoleEventType::CircleChangesApplied),
            _ => None,
        }
    }
}

/// A derived record attached to a role at one commit timeline, persisted as
/// a JSON blob in the `roleevent` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEvent {
    pub id: Uuid,
    pub time_line: TimeLineNumber,
    pub role_id: Uuid,
    pub data: RoleEventData,
}

impl RoleEvent {
    /// Returns a fresh, empty `CircleChangesApplied` digest for the circle
    /// `role_id` at `time_line`.
    pub fn new_circle_changes_applied(
        time_line: TimeLineNumber,
        id: Uuid,
        role_id: Uuid,
        issuer_id: Uuid,
    ) -> RoleEvent {
        RoleEvent {
            id,
            time_line,
            role_id,
            data: RoleEventData::CircleChangesApplied(RoleEventCircleChangesApplied {
                issuer_id,
                changed_roles: HashMap::new(),
                roles_to_circle: HashMap::new(),
                roles_from_circle: HashMap::new(),
            }),
        }
    }

    pub fn event_type(&self) -> RoleEventType {
        match self.data {
            RoleEventData::CircleChangesApplied(_) => RoleEventType::CircleChangesApplied,
        }
    }
}

/// Typed payloads per [`RoleEventType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleEventData {
    CircleChangesApplied(RoleEventCircleChangesApplied),
}

/// Digest of all structural changes a single command applied to the child
/// roles of one circle.
///
/// At most one digest exists per `(role, timeline)`; the applier folds every
/// physical mutation of the commit into it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEventCircleChangesApplied {
    pub issuer_id: Uuid,

    /// Change record per affected child role.
    pub changed_roles: HashMap<Uuid, RoleChange>,

    /// Roles which left this circle, mapped to the circle they moved to.
    pub roles_to_circle: HashMap<Uuid, Uuid>,

    /// Roles which joined this circle, mapped to the circle they came from.
    pub roles_from_circle: HashMap<Uuid, Uuid>,
}

/// How one child role changed within a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeType {
    New,
    Updated,
    Deleted,
}

/// The previous and new parent of a moved role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleParentChange {
    pub previous_parent: Uuid,
    pub new_parent: Uuid,
}

/// Change record of one child role inside a digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleChange {
    pub change_type: ChangeType,
    pub moved: Option<RoleParentChange>,
    pub roles_moved_to_parent: Vec<Uuid>,
    pub roles_moved_from_parent: Vec<Uuid>,
}

impl RoleChange {
    pub fn new(change_type: ChangeType) -> RoleChange {
        RoleChange {
            change_type,
            moved: None,
            roles_moved_to_parent: Vec::new(),
            roles_moved_from_parent: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{ChangeType, RoleChange, RoleEvent, RoleEventCircleChangesApplied, RoleEventData};
    use crate::db::types::TimeLineNumber;

    #[test]
    fn digest_payload_survives_json_round_trip() {
        let mut role_event = RoleEvent::new_circle_changes_applied(
            TimeLineNumber(42),
            Uuid::from_u128(1),
            Uuid::from_u128(2),
            Uuid::from_u128(3),
        );
        let RoleEventData::CircleChangesApplied(data) = &mut role_event.data;
        data.changed_roles
            .insert(Uuid::from_u128(4), RoleChange::new(ChangeType::New));
        data.roles_to_circle
            .insert(Uuid::from_u128(4), Uuid::from_u128(5));

        let encoded = serde_json::to_string(data).unwrap();
        let decoded: RoleEventCircleChangesApplied = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.issuer_id, Uuid::from_u128(3));
        assert_eq!(
            decoded.changed_roles[&Uuid::from_u128(4)].change_type,
            ChangeType::New
        );
        assert_eq!(
            decoded.roles_to_circle[&Uuid::from_u128(4)],
            Uuid::from_u128(5)
        );
    }
}
