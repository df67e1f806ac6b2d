// SPDX-License-Identifier: AGPL-3.0-or-later

//! The event applier: consumes the ordered domain event log and translates
//! every event into temporal graph mutations, advancing the projection's
//! timeline one event group at a time.
//!
//! Two passes run per event: the graph mutation pass below and the
//! role-event digest pass in [`digest`]. Both act at the timeline of the
//! event's group; all writes happen inside the ambient transaction, so a
//! failing event rolls its whole group back.
use async_recursion::async_recursion;
use log::debug;
use uuid::Uuid;

use crate::db::errors::StoreError;
use crate::db::graph::GraphTx;
use crate::db::schema::{EdgeClass, VertexClass};
use crate::db::types::{
    Accountability, Domain, Member, MemberAvatar, Role, RoleAdditionalContent, Tension,
    TimeLineNumber,
};
use crate::events::{Event, EventData};

mod digest;

/// Apply an ordered batch of events, then verify the edge integrity of the
/// resulting graph.
pub async fn apply_events(tx: &mut GraphTx<'_>, events: &[Event]) -> Result<(), StoreError> {
    for event in events {
        apply_event(tx, event).await?;
    }

    let cur_tl = tx.cur_time_line().number();
    tx.check_broken_edges(cur_tl).await?;

    Ok(())
}

/// Apply a single event at the timeline of its group. Events without a
/// group id are skipped.
pub async fn apply_event(tx: &mut GraphTx<'_>, event: &Event) -> Result<(), StoreError> {
    let group_id = match event.group_id {
        Some(group_id) => group_id,
        None => return Ok(()),
    };

    let tl = match tx.time_line_for_group_id(group_id).await? {
        Some(tl) => tl,
        None => {
            debug!("opening timeline for group id {}", group_id);

            tx.insert_time_line(
                event.timestamp,
                group_id,
                &event.aggregate_type,
                event.aggregate_id,
            )
            .await?;

            // Reread the inserted timeline since the storage may persist
            // timestamps at a lower (e.g. microsecond) resolution
            tx.time_line_for_group_id(group_id).await?.ok_or_else(|| {
                StoreError::Transaction(format!(
                    "timeline for group id {} disappeared after insert",
                    group_id
                ))
            })?
        }
    };

    tx.refresh_cur_time_line().await?;

    let tl = tl.number();

    // the mutation pass closes the parent edge of a deleted role; resolve
    // the parent first so the digest pass still knows it
    let deleted_role_parent = match &event.data {
        EventData::RoleDeleted { role_id } => {
            let mut parent_groups = tx.role_parent(tl, &[*role_id]).await?;
            parent_groups.remove(role_id)
        }
        _ => None,
    };

    apply_graph_mutations(tx, event, tl).await?;
    digest::apply_digest(tx, event, tl, deleted_role_parent).await?;

    Ok(())
}

async fn apply_graph_mutations(
    tx: &mut GraphTx<'_>,
    event: &Event,
    tl: TimeLineNumber,
) -> Result<(), StoreError> {
    match &event.data {
        EventData::CommandExecuted { .. } | EventData::CommandExecutionFinished => (),

        EventData::RoleCreated {
            role_id,
            role_type,
            name,
            purpose,
            parent_role_id,
        } => {
            // We have to calculate the role depth
            let depth = match parent_role_id {
                Some(parent_role_id) => role_at(tx, tl, *parent_role_id).await?.depth + 1,
                None => 0,
            };

            let role = Role {
                role_type: *role_type,
                depth,
                name: name.clone(),
                purpose: purpose.clone(),
                ..Default::default()
            };
            tx.new_vertex(tl, *role_id, &role).await?;

            if let Some(parent_role_id) = parent_role_id {
                tx.add_edge(tl, EdgeClass::RoleRole, *parent_role_id, *role_id)
                    .await?;
            }
        }

        EventData::RoleUpdated {
            role_id,
            role_type,
            name,
            purpose,
        } => {
            // We have to retrieve the current role depth
            let cur_role = role_at(tx, tl, *role_id).await?;

            let role = Role {
                role_type: *role_type,
                depth: cur_role.depth,
                name: name.clone(),
                purpose: purpose.clone(),
                ..Default::default()
            };
            tx.update_vertex(tl, *role_id, &role).await?;
        }

        EventData::RoleDeleted { role_id } => {
            let parent_groups = tx.role_parent(tl, &[*role_id]).await?;

            tx.delete_vertex(tl, VertexClass::Role, *role_id).await?;

            if let Some(parent) = parent_groups.get(role_id) {
                tx.delete_edge(tl, EdgeClass::RoleRole, parent.id, *role_id)
                    .await?;
            }
        }

        EventData::RoleChangedParent {
            role_id,
            parent_role_id,
        } => {
            change_role_parent(tx, tl, *role_id, *parent_role_id).await?;
        }

        EventData::RoleDomainCreated {
            domain_id,
            role_id,
            description,
        } => {
            let domain = Domain {
                description: description.clone(),
                ..Default::default()
            };
            tx.new_vertex(tl, *domain_id, &domain).await?;
            tx.add_edge(tl, EdgeClass::RoleDomain, *domain_id, *role_id)
                .await?;
        }

        EventData::RoleDomainUpdated {
            domain_id,
            description,
            ..
        } => {
            let domain = Domain {
                description: description.clone(),
                ..Default::default()
            };
            tx.update_vertex(tl, *domain_id, &domain).await?;
        }

        EventData::RoleDomainDeleted { domain_id, role_id } => {
            tx.delete_vertex(tl, VertexClass::Domain, *domain_id).await?;
            tx.delete_edge(tl, EdgeClass::RoleDomain, *domain_id, *role_id)
                .await?;
        }

        EventData::RoleAccountabilityCreated {
            accountability_id,
            role_id,
            description,
        } => {
            let accountability = Accountability {
                description: description.clone(),
                ..Default::default()
            };
            tx.new_vertex(tl, *accountability_id, &accountability).await?;
            tx.add_edge(
                tl,
                EdgeClass::RoleAccountability,
                *accountability_id,
                *role_id,
            )
            .await?;
        }

        EventData::RoleAccountabilityUpdated {
            accountability_id,
            description,
            ..
        } => {
            let accountability = Accountability {
                description: description.clone(),
                ..Default::default()
            };
            tx.update_vertex(tl, *accountability_id, &accountability)
                .await?;
        }

        EventData::RoleAccountabilityDeleted {
            accountability_id,
            role_id,
        } => {
            tx.delete_vertex(tl, VertexClass::Accountability, *accountability_id)
                .await?;
            tx.delete_edge(
                tl,
                EdgeClass::RoleAccountability,
                *accountability_id,
                *role_id,
            )
            .await?;
        }

        EventData::RoleAdditionalContentSet { role_id, content } => {
            let additional_content = RoleAdditionalContent {
                content: content.clone(),
                ..Default::default()
            };
            tx.update_vertex(tl, *role_id, &additional_content).await?;
        }

        EventData::RoleMemberAdded {
            role_id,
            member_id,
            focus,
            no_core_member,
        } => {
            tx.add_role_member_edge(
                tl,
                *member_id,
                *role_id,
                focus.as_deref(),
                *no_core_member,
                None,
            )
            .await?;
        }

        EventData::RoleMemberUpdated {
            role_id,
            member_id,
            focus,
            no_core_member,
        } => {
            tx.delete_edge(tl, EdgeClass::RoleMember, *member_id, *role_id)
                .await?;
            tx.add_role_member_edge(
                tl,
                *member_id,
                *role_id,
                focus.as_deref(),
                *no_core_member,
                None,
            )
            .await?;
        }

        EventData::RoleMemberRemoved { role_id, member_id } => {
            tx.delete_edge(tl, EdgeClass::RoleMember, *member_id, *role_id)
                .await?;
        }

        EventData::CircleDirectMemberAdded { role_id, member_id } => {
            tx.add_edge(tl, EdgeClass::CircleDirectMember, *member_id, *role_id)
                .await?;
        }

        EventData::CircleDirectMemberRemoved { role_id, member_id } => {
            tx.delete_edge(tl, EdgeClass::CircleDirectMember, *member_id, *role_id)
                .await?;
        }

        EventData::CircleLeadLinkMemberSet {
            lead_link_role_id,
            member_id,
            ..
        } => {
            tx.add_role_member_edge(tl, *member_id, *lead_link_role_id, None, false, None)
                .await?;
        }

        EventData::CircleLeadLinkMemberUnset {
            lead_link_role_id,
            member_id,
            ..
        } => {
            tx.delete_edge(tl, EdgeClass::RoleMember, *member_id, *lead_link_role_id)
                .await?;
        }

        EventData::CircleCoreRoleMemberSet {
            core_role_id,
            member_id,
            election_expiration,
            ..
        } => {
            tx.add_role_member_edge(
                tl,
                *member_id,
                *core_role_id,
                None,
                false,
                *election_expiration,
            )
            .await?;
        }

        EventData::CircleCoreRoleMemberUnset {
            core_role_id,
            member_id,
            ..
        } => {
            tx.delete_edge(tl, EdgeClass::RoleMember, *member_id, *core_role_id)
                .await?;
        }

        EventData::TensionCreated {
            title,
            description,
            member_id,
            role_id,
        } => {
            let tension_id = event.aggregate_id;

            let tension = Tension {
                title: title.clone(),
                description: description.clone(),
                closed: false,
                ..Default::default()
            };
            tx.new_vertex(tl, tension_id, &tension).await?;
            tx.add_edge(tl, EdgeClass::MemberTension, tension_id, *member_id)
                .await?;

            if let Some(role_id) = role_id {
                tx.add_edge(tl, EdgeClass::RoleTension, tension_id, *role_id)
                    .await?;
            }
        }

        EventData::TensionUpdated { title, description } => {
            let tension_id = event.aggregate_id;

            let tension = Tension {
                title: title.clone(),
                description: description.clone(),
                closed: false,
                ..Default::default()
            };
            tx.update_vertex(tl, tension_id, &tension).await?;
        }

        EventData::TensionRoleChanged {
            prev_role_id,
            role_id,
        } => {
            let tension_id = event.aggregate_id;

            if let Some(prev_role_id) = prev_role_id {
                tx.delete_edge(tl, EdgeClass::RoleTension, tension_id, *prev_role_id)
                    .await?;
            }
            if let Some(role_id) = role_id {
                tx.add_edge(tl, EdgeClass::RoleTension, tension_id, *role_id)
                    .await?;
            }
        }

        EventData::TensionClosed { reason } => {
            let tension_id = event.aggregate_id;

            let mut tension = tx.tension(tl, tension_id).await?.ok_or_else(|| {
                StoreError::InvariantViolated(format!(
                    "tension with id {} doesn't exist",
                    tension_id
                ))
            })?;

            tension.closed = true;
            tension.close_reason = reason.clone();
            tx.update_vertex(tl, tension_id, &tension).await?;
        }

        EventData::MemberCreated {
            is_admin,
            user_name,
            full_name,
            email,
        } => {
            let member_id = event.aggregate_id;

            let member = Member {
                is_admin: *is_admin,
                user_name: user_name.clone(),
                full_name: full_name.clone(),
                email: email.clone(),
                ..Default::default()
            };
            tx.new_vertex(tl, member_id, &member).await?;
        }

        EventData::MemberUpdated {
            is_admin,
            user_name,
            full_name,
            email,
        } => {
            let member_id = event.aggregate_id;

            let member = Member {
                is_admin: *is_admin,
                user_name: user_name.clone(),
                full_name: full_name.clone(),
                email: email.clone(),
                ..Default::default()
            };
            tx.update_vertex(tl, member_id, &member).await?;
        }

        EventData::MemberPasswordSet { password_hash } => {
            tx.set_member_password(event.aggregate_id, password_hash)
                .await?;
        }

        EventData::MemberAvatarSet { image } => {
            let member_avatar = MemberAvatar {
                image: image.clone(),
                ..Default::default()
            };
            tx.update_vertex(tl, event.aggregate_id, &member_avatar)
                .await?;
        }
    }

    Ok(())
}

/// Re-parent a role: swap the parent edge, recompute the role's depth and
/// walk all descendants to keep their depths consistent.
async fn change_role_parent(
    tx: &mut GraphTx<'_>,
    next_tl: TimeLineNumber,
    role_id: Uuid,
    new_parent_id: Option<Uuid>,
) -> Result<(), StoreError> {
    let cur_tl = next_tl.prev();

    let cur_parent_groups = tx.role_parent(cur_tl, &[role_id]).await?;
    if let Some(cur_parent) = cur_parent_groups.get(&role_id) {
        tx.delete_edge(next_tl, EdgeClass::RoleRole, cur_parent.id, role_id)
            .await?;
    }
    if let Some(new_parent_id) = new_parent_id {
        tx.add_edge(next_tl, EdgeClass::RoleRole, new_parent_id, role_id)
            .await?;
    }

    // Update role depth
    let mut role = role_at(tx, next_tl, role_id).await?;
    role.depth = match new_parent_id {
        Some(new_parent_id) => role_at(tx, next_tl, new_parent_id).await?.depth + 1,
        None => 0,
    };
    tx.update_vertex(next_tl, role_id, &role).await?;

    update_childs_depth(tx, next_tl, role.depth, role_id).await?;

    Ok(())
}

/// Recursively update all child roles depth.
#[async_recursion]
async fn update_childs_depth(
    tx: &mut GraphTx<'_>,
    tl: TimeLineNumber,
    parent_depth: i64,
    role_id: Uuid,
) -> Result<(), StoreError> {
    let childs_groups = tx.child_roles(tl, &[role_id]).await?;
    let childs = childs_groups.get(&role_id).cloned().unwrap_or_default();

    let depth = parent_depth + 1;
    for mut child in childs {
        child.depth = depth;
        tx.update_vertex(tl, child.id, &child).await?;
        update_childs_depth(tx, tl, depth, child.id).await?;
    }

    Ok(())
}

/// Fetch a role which is required to exist at this point of event
/// application.
pub(crate) async fn role_at(
    tx: &mut GraphTx<'_>,
    tl: TimeLineNumber,
    role_id: Uuid,
) -> Result<Role, StoreError> {
    tx.role(tl, role_id).await?.ok_or_else(|| {
        StoreError::InvariantViolated(format!("role with id {} doesn't exist", role_id))
    })
}

#[cfg(test)]
mod tests {
    use super::{apply_event, apply_events};
    use crate::db::test_utils::{circle_created, ev, role_created, test_db, uid};
    use crate::db::types::{RoleType, TimeLineNumber};
    use crate::events::EventData;

    #[tokio::test]
    async fn root_role_creation() {
        let db = test_db().await;
        let mut tx = db.begin().await.unwrap();

        let root = uid(10);
        apply_events(&mut tx, &[circle_created(1, 1, root, None, "Root")])
            .await
            .unwrap();

        assert_eq!(tx.cur_time_line().number(), TimeLineNumber(1));

        let role = tx.root_role(TimeLineNumber(1)).await.unwrap().unwrap();
        assert_eq!(role.id, root);
        assert_eq!(role.depth, 0);
        assert_eq!(role.name, "Root");
    }

    #[tokio::test]
    async fn events_without_a_group_are_skipped() {
        let db = test_db().await;
        let mut tx = db.begin().await.unwrap();

        let mut event = circle_created(1, 1, uid(10), None, "Root");
        event.group_id = None;
        apply_event(&mut tx, &event).await.unwrap();

        assert_eq!(tx.cur_time_line().number(), TimeLineNumber(0));
    }

    #[tokio::test]
    async fn child_roles_and_parent_change() {
        let db = test_db().await;
        let mut tx = db.begin().await.unwrap();

        let (root, alpha, beta) = (uid(10), uid(11), uid(12));
        apply_events(
            &mut tx,
            &[
                circle_created(1, 1, root, None, "Root"),
                circle_created(2, 2, alpha, Some(root), "Alpha"),
                circle_created(3, 3, beta, Some(root), "Beta"),
                ev(
                    4,
                    4,
                    alpha,
                    EventData::RoleChangedParent {
                        role_id: alpha,
                        parent_role_id: Some(beta),
                    },
                ),
            ],
        )
        .await
        .unwrap();

        // every group advanced the timeline
        assert_eq!(tx.cur_time_line().number(), TimeLineNumber(4));

        // time travel: before the move alpha sits under the root
        assert_eq!(
            tx.role(TimeLineNumber(2), alpha).await.unwrap().unwrap().depth,
            1
        );
        let children_before = tx.child_roles(TimeLineNumber(3), &[root]).await.unwrap();
        let names: Vec<&str> = children_before[&root].iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);

        // after the move alpha sits under beta
        assert_eq!(
            tx.role(TimeLineNumber(4), alpha).await.unwrap().unwrap().depth,
            2
        );
        let chain = tx.role_parents(TimeLineNumber(4), &[alpha]).await.unwrap();
        let chain_ids: Vec<_> = chain[&alpha].iter().map(|r| r.id).collect();
        assert_eq!(chain_ids, vec![beta, root]);

        let children_after = tx.child_roles(TimeLineNumber(4), &[root]).await.unwrap();
        let names: Vec<&str> = children_after[&root].iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Beta"]);
    }

    #[tokio::test]
    async fn parent_change_cascades_depth_to_descendants() {
        let db = test_db().await;
        let mut tx = db.begin().await.unwrap();

        // a (0) ─ e (1) ─ d (2)
        //   └──── b (1) ─ c (2)
        let (a, e, d, b, c) = (uid(1), uid(2), uid(3), uid(4), uid(5));
        apply_events(
            &mut tx,
            &[
                circle_created(1, 1, a, None, "a"),
                circle_created(2, 2, e, Some(a), "e"),
                circle_created(3, 3, d, Some(e), "d"),
                circle_created(4, 4, b, Some(a), "b"),
                circle_created(5, 5, c, Some(b), "c"),
                ev(
                    6,
                    6,
                    b,
                    EventData::RoleChangedParent {
                        role_id: b,
                        parent_role_id: Some(d),
                    },
                ),
            ],
        )
        .await
        .unwrap();

        let tl = TimeLineNumber(6);
        for (role_id, depth) in [(a, 0), (e, 1), (d, 2), (b, 3), (c, 4)] {
            assert_eq!(
                tx.role(tl, role_id).await.unwrap().unwrap().depth,
                depth,
                "unexpected depth of {}",
                role_id
            );
        }
    }

    #[tokio::test]
    async fn role_update_preserves_depth() {
        let db = test_db().await;
        let mut tx = db.begin().await.unwrap();

        let (root, child) = (uid(1), uid(2));
        apply_events(
            &mut tx,
            &[
                circle_created(1, 1, root, None, "Root"),
                role_created(2, 2, child, Some(root), RoleType::Normal, "Scribe"),
                ev(
                    3,
                    3,
                    child,
                    EventData::RoleUpdated {
                        role_id: child,
                        role_type: RoleType::Normal,
                        name: "Archivist".to_owned(),
                        purpose: "keep the records".to_owned(),
                    },
                ),
            ],
        )
        .await
        .unwrap();

        let updated = tx.role(TimeLineNumber(3), child).await.unwrap().unwrap();
        assert_eq!(updated.name, "Archivist");
        assert_eq!(updated.purpose, "keep the records");
        assert_eq!(updated.depth, 1);

        let before = tx.role(TimeLineNumber(2), child).await.unwrap().unwrap();
        assert_eq!(before.name, "Scribe");
    }

    #[tokio::test]
    async fn role_deletion_closes_the_parent_edge() {
        let db = test_db().await;
        let mut tx = db.begin().await.unwrap();

        let (root, child) = (uid(1), uid(2));
        apply_events(
            &mut tx,
            &[
                circle_created(1, 1, root, None, "Root"),
                role_created(2, 2, child, Some(root), RoleType::Normal, "Scribe"),
                ev(3, 3, child, EventData::RoleDeleted { role_id: child }),
            ],
        )
        .await
        .unwrap();

        assert!(tx.role(TimeLineNumber(3), child).await.unwrap().is_none());
        assert!(tx
            .child_roles(TimeLineNumber(3), &[root])
            .await
            .unwrap()
            .is_empty());

        // the integrity check ran as part of apply_events; the pre-deletion
        // state is still intact
        let children = tx.child_roles(TimeLineNumber(2), &[root]).await.unwrap();
        assert_eq!(children[&root].len(), 1);
    }
}
