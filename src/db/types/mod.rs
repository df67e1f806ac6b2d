// SPDX-License-Identifier: AGPL-3.0-or-later

//! Domain types returned by the read API, distinct from the raw row structs
//! in `db/models/` which mirror the SQL tables.
mod member;
mod role;
mod role_event;
mod tension;
mod timeline;

pub use member::{
    CircleMemberEdge, Member, MemberAvatar, MemberCircleEdge, MemberCirclePermissions,
    MemberRoleEdge, RoleMemberEdge,
};
pub use role::{Accountability, Domain, Role, RoleAdditionalContent, RoleType};
pub use role_event::{
    ChangeType, RoleChange, RoleEvent, RoleEventCircleChangesApplied, RoleEventData,
    RoleEventType, RoleParentChange,
};
pub use tension::Tension;
pub use timeline::{TimeLine, TimeLineNumber};
