// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::types::TimeLineNumber;

/// Kind of a role vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    Normal,
    Circle,
    LeadLink,
    RepLink,
    Secretary,
    Facilitator,
}

impl RoleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleType::Normal => "normal",
            RoleType::Circle => "circle",
            RoleType::LeadLink => "leadlink",
            RoleType::RepLink => "replink",
            RoleType::Secretary => "secretary",
            RoleType::Facilitator => "facilitator",
        }
    }

    pub fn parse(value: &str) -> Option<RoleType> {
        match value {
            "normal" => Some(RoleType::Normal),
            "circle" => Some(RoleType::Circle),
            "leadlink" => Some(RoleType::LeadLink),
            "replink" => Some(RoleType::RepLink),
            "secretary" => Some(RoleType::Secretary),
            "facilitator" => Some(RoleType::Facilitator),
            _ => None,
        }
    }

    /// Core roles are created and deleted together with their circle and are
    /// not reported in role-change digests.
    pub fn is_core_role_type(&self) -> bool {
        matches!(
            self,
            RoleType::LeadLink | RoleType::RepLink | RoleType::Secretary | RoleType::Facilitator
        )
    }
}

impl Default for RoleType {
    fn default() -> Self {
        RoleType::Normal
    }
}

/// A role vertex version. Roles of type [`RoleType::Circle`] are internal
/// nodes of the role tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Role {
    pub id: Uuid,
    pub start_tl: TimeLineNumber,
    pub end_tl: Option<TimeLineNumber>,
    pub role_type: RoleType,
    /// Distance from the root role. The root has depth 0, every other role
    /// has its parent's depth plus one.
    pub depth: i64,
    pub name: String,
    pub purpose: String,
}

/// A domain vertex version, attached to exactly one role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Domain {
    pub id: Uuid,
    pub start_tl: TimeLineNumber,
    pub end_tl: Option<TimeLineNumber>,
    pub description: String,
}

/// An accountability vertex version, attached to exactly one role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Accountability {
    pub id: Uuid,
    pub start_tl: TimeLineNumber,
    pub end_tl: Option<TimeLineNumber>,
    pub description: String,
}

/// Free-form additional content of a role. Shares the role's id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleAdditionalContent {
    pub id: Uuid,
    pub start_tl: TimeLineNumber,
    pub end_tl: Option<TimeLineNumber>,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::RoleType;

    #[rstest]
    #[case(RoleType::Normal, "normal", false)]
    #[case(RoleType::Circle, "circle", false)]
    #[case(RoleType::LeadLink, "leadlink", true)]
    #[case(RoleType::RepLink, "replink", true)]
    #[case(RoleType::Secretary, "secretary", true)]
    #[case(RoleType::Facilitator, "facilitator", true)]
    fn role_type_round_trip(
        #[case] role_type: RoleType,
        #[case] stored: &str,
        #[case] is_core: bool,
    ) {
        assert_eq!(role_type.as_str(), stored);
        assert_eq!(RoleType::parse(stored), Some(role_type));
        assert_eq!(role_type.is_core_role_type(), is_core);
    }

    #[test]
    fn unknown_role_type_does_not_parse() {
        assert_eq!(RoleType::parse("ceo"), None);
    }
}
