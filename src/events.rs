// SPDX-License-Identifier: AGPL-3.0-or-later

//! Input types consumed by the event applier.
//!
//! The event log itself is an external collaborator; it hands the applier an
//! ordered stream of [`Event`] values, each tagged with the group id of the
//! command execution which produced it.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::types::RoleType;

/// A single entry of the domain event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Id of the event itself.
    pub id: Uuid,

    /// Id of the event batch this event belongs to. Events without a group
    /// are ignored by the applier.
    pub group_id: Option<Uuid>,

    /// Aggregate which emitted the event.
    pub aggregate_type: String,
    pub aggregate_id: Uuid,

    /// Unix timestamp in nanoseconds. The timestamp of the first event of a
    /// group becomes the group's timeline number.
    pub timestamp: i64,

    /// Discriminated event payload.
    pub data: EventData,
}

/// The command which opened an event group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    pub issuer_id: Uuid,
    pub data: CommandData,
}

/// Commands relevant for role-event digest synthesis. Everything else is
/// carried opaquely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CommandData {
    /// `role_id` is the parent circle the command was executed on.
    CircleCreateChildRole { role_id: Uuid },
    CircleUpdateChildRole { role_id: Uuid },
    CircleDeleteChildRole { role_id: Uuid },
    Other,
}

/// Discriminated event payloads.
///
/// The applier matches exhaustively on this enum; an event type it can not
/// handle is unrepresentable by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventData {
    CommandExecuted {
        command: Command,
    },
    CommandExecutionFinished,

    RoleCreated {
        role_id: Uuid,
        role_type: RoleType,
        name: String,
        purpose: String,
        parent_role_id: Option<Uuid>,
    },
    RoleUpdated {
        role_id: Uuid,
        role_type: RoleType,
        name: String,
        purpose: String,
    },
    RoleDeleted {
        role_id: Uuid,
    },
    RoleChangedParent {
        role_id: Uuid,
        parent_role_id: Option<Uuid>,
    },

    RoleDomainCreated {
        domain_id: Uuid,
        role_id: Uuid,
        description: String,
    },
    RoleDomainUpdated {
        domain_id: Uuid,
        role_id: Uuid,
        description: String,
    },
    RoleDomainDeleted {
        domain_id: Uuid,
        role_id: Uuid,
    },

    RoleAccountabilityCreated {
        accountability_id: Uuid,
        role_id: Uuid,
        description: String,
    },
    RoleAccountabilityUpdated {
        accountability_id: Uuid,
        role_id: Uuid,
        description: String,
    },
    RoleAccountabilityDeleted {
        accountability_id: Uuid,
        role_id: Uuid,
    },

    RoleAdditionalContentSet {
        role_id: Uuid,
        content: String,
    },

    RoleMemberAdded {
        role_id: Uuid,
        member_id: Uuid,
        focus: Option<String>,
        no_core_member: bool,
    },
    RoleMemberUpdated {
        role_id: Uuid,
        member_id: Uuid,
        focus: Option<String>,
        no_core_member: bool,
    },
    RoleMemberRemoved {
        role_id: Uuid,
        member_id: Uuid,
    },

    CircleDirectMemberAdded {
        role_id: Uuid,
        member_id: Uuid,
    },
    CircleDirectMemberRemoved {
        role_id: Uuid,
        member_id: Uuid,
    },

    CircleLeadLinkMemberSet {
        role_id: Uuid,
        lead_link_role_id: Uuid,
        member_id: Uuid,
    },
    CircleLeadLinkMemberUnset {
        role_id: Uuid,
        lead_link_role_id: Uuid,
        member_id: Uuid,
    },
    CircleCoreRoleMemberSet {
        role_id: Uuid,
        core_role_id: Uuid,
        member_id: Uuid,
        election_expiration: Option<i64>,
    },
    CircleCoreRoleMemberUnset {
        role_id: Uuid,
        core_role_id: Uuid,
        member_id: Uuid,
    },

    /// The tension id is the event's aggregate id.
    TensionCreated {
        title: String,
        description: String,
        member_id: Uuid,
        role_id: Option<Uuid>,
    },
    TensionUpdated {
        title: String,
        description: String,
    },
    TensionRoleChanged {
        prev_role_id: Option<Uuid>,
        role_id: Option<Uuid>,
    },
    TensionClosed {
        reason: String,
    },

    /// The member id is the event's aggregate id.
    MemberCreated {
        is_admin: bool,
        user_name: String,
        full_name: String,
        email: String,
    },
    MemberUpdated {
        is_admin: bool,
        user_name: String,
        full_name: String,
        email: String,
    },
    MemberPasswordSet {
        password_hash: String,
    },
    MemberAvatarSet {
        image: String,
    },
}
