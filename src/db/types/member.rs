// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::Serialize;
use uuid::Uuid;

use crate::db::types::{Role, TimeLineNumber};

/// A member vertex version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Member {
    pub id: Uuid,
    pub start_tl: TimeLineNumber,
    pub end_tl: Option<TimeLineNumber>,
    pub is_admin: bool,
    pub user_name: String,
    pub full_name: String,
    pub email: String,
}

/// A member's avatar image. Shares the member's id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemberAvatar {
    pub id: Uuid,
    pub start_tl: TimeLineNumber,
    pub end_tl: Option<TimeLineNumber>,
    /// Encoded image data as provided by the upstream event.
    pub image: String,
}

/// A `role↔member` edge joined with the member vertex, anchored at the role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleMemberEdge {
    pub member: Member,
    pub focus: Option<String>,
    pub no_core_member: bool,
    pub election_expiration: Option<i64>,
}

/// A `role↔member` edge joined with the role vertex, anchored at the member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRoleEdge {
    pub role: Role,
    pub focus: Option<String>,
    pub no_core_member: bool,
    pub election_expiration: Option<i64>,
}

/// Aggregate edge between a member and a circle, anchored at the member.
///
/// Derived from direct membership, filled child roles and rep links of sub
/// circles; see the circle↔member rollup queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemberCircleEdge {
    pub role: Role,
    pub is_core_member: bool,
    pub is_direct_member: bool,
    pub is_lead_link: bool,
    pub filled_roles: Vec<Role>,
    pub rep_link: Vec<Role>,
}

/// Mirror of [`MemberCircleEdge`], anchored at the circle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CircleMemberEdge {
    pub member: Member,
    pub is_core_member: bool,
    pub is_direct_member: bool,
    pub is_lead_link: bool,
    pub filled_roles: Vec<Role>,
    pub rep_link: Vec<Role>,
}

/// Management permissions of the calling member on one circle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemberCirclePermissions {
    pub assign_child_circle_lead_link: bool,
    pub assign_circle_core_roles: bool,
    pub assign_child_role_members: bool,
    pub assign_circle_direct_members: bool,
    pub manage_child_roles: bool,
    pub manage_role_additional_content: bool,
    /// Granted on the root circle only.
    pub assign_root_circle_lead_link: bool,
    /// Granted on the root circle only.
    pub manage_root_circle: bool,
}
