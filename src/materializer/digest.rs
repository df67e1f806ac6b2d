// SPDX-License-Identifier: AGPL-3.0-or-later

//! The role-event digest pass.
//!
//! Commands executed on a circle which create, update or delete child roles
//! produce one `CircleChangesApplied` digest per `(circle, timeline)`. The
//! `CommandExecuted` event leads its group and inserts the empty digest;
//! every structural sub-event of the group then folds its change into it.
//! When no digest row exists for a sub-event's circle, the group was not
//! started by such a command and the pass is skipped.
use uuid::Uuid;

use crate::db::errors::StoreError;
use crate::db::graph::GraphTx;
use crate::db::types::{
    ChangeType, Role, RoleChange, RoleEvent, RoleEventCircleChangesApplied, RoleEventData,
    RoleParentChange, TimeLineNumber,
};
use crate::events::{CommandData, Event, EventData};
use crate::materializer::role_at;

pub(super) async fn apply_digest(
    tx: &mut GraphTx<'_>,
    event: &Event,
    tl: TimeLineNumber,
    deleted_role_parent: Option<Role>,
) -> Result<(), StoreError> {
    match &event.data {
        EventData::CommandExecuted { command } => {
            let role_id = match &command.data {
                CommandData::CircleCreateChildRole { role_id }
                | CommandData::CircleUpdateChildRole { role_id }
                | CommandData::CircleDeleteChildRole { role_id } => *role_id,
                CommandData::Other => return Ok(()),
            };

            let role_event =
                RoleEvent::new_circle_changes_applied(tl, event.id, role_id, command.issuer_id);
            tx.insert_role_event(&role_event).await?;
        }

        EventData::RoleCreated {
            role_id,
            role_type,
            parent_role_id,
            ..
        } => {
            // skip core roles, they are created together with their circle
            if role_type.is_core_role_type() {
                return Ok(());
            }
            let parent_role_id = match parent_role_id {
                Some(parent_role_id) => *parent_role_id,
                None => return Ok(()),
            };
            let parent = role_at(tx, tl, parent_role_id).await?;

            let mut role_event = match tx.circle_changes_applied_role_event(tl, parent.id).await? {
                Some(role_event) => role_event,
                None => return Ok(()),
            };

            {
                let data = changes_data(&mut role_event);
                if data.changed_roles.contains_key(role_id) {
                    panic!("role already recorded in the circle changes digest");
                }
                data.changed_roles
                    .insert(*role_id, RoleChange::new(ChangeType::New));
            }

            tx.insert_role_event(&role_event).await?;
        }

        EventData::RoleDeleted { role_id } => {
            // the parent edge was already closed by the mutation pass; the
            // applier resolved it beforehand
            let parent = match deleted_role_parent {
                Some(parent) => parent,
                None => return Ok(()),
            };

            let mut role_event = match tx.circle_changes_applied_role_event(tl, parent.id).await? {
                Some(role_event) => role_event,
                None => return Ok(()),
            };

            {
                let data = changes_data(&mut role_event);
                let created_in_this_commit = matches!(
                    data.changed_roles.get(role_id),
                    Some(change) if change.change_type == ChangeType::New
                );
                if created_in_this_commit {
                    // the same commit created and deleted the role, the two
                    // changes cancel out
                    data.changed_roles.remove(role_id);
                } else {
                    // the role was deleted, always overwrite any previous
                    // change type
                    data.changed_roles
                        .entry(*role_id)
                        .or_insert_with(|| RoleChange::new(ChangeType::Deleted))
                        .change_type = ChangeType::Deleted;
                }
            }

            tx.insert_role_event(&role_event).await?;
        }

        EventData::RoleUpdated { role_id, .. } => {
            let parent_groups = tx.role_parent(tl, &[*role_id]).await?;
            let parent = match parent_groups.get(role_id) {
                // an update of the root role contributes to no digest
                Some(parent) => parent.clone(),
                None => return Ok(()),
            };

            let mut role_event = match tx.circle_changes_applied_role_event(tl, parent.id).await? {
                Some(role_event) => role_event,
                None => return Ok(()),
            };

            changes_data(&mut role_event)
                .changed_roles
                .entry(*role_id)
                .or_insert_with(|| RoleChange::new(ChangeType::Updated));

            tx.insert_role_event(&role_event).await?;
        }

        EventData::RoleChangedParent {
            role_id,
            parent_role_id,
        } => {
            let parent_role_id = match parent_role_id {
                Some(parent_role_id) => *parent_role_id,
                None => return Ok(()),
            };
            let parent = role_at(tx, tl, parent_role_id).await?;

            let prev_parent_groups = tx.role_parent(tl.prev(), &[*role_id]).await?;
            let prev_parent = prev_parent_groups.get(role_id).ok_or_else(|| {
                StoreError::InvariantViolated(format!(
                    "parent of role with id {} doesn't exist",
                    role_id
                ))
            })?;

            // handle the role moved towards the circle on which the command
            // was executed (from a child circle up into the parent)
            if let Some(mut role_event) =
                tx.circle_changes_applied_role_event(tl, parent.id).await?
            {
                let data = changes_data(&mut role_event);

                data.roles_to_circle.insert(*role_id, prev_parent.id);
                record_move(data, *role_id, prev_parent.id, parent.id);

                // the old parent is a changed child of this circle too
                data.changed_roles
                    .entry(prev_parent.id)
                    .or_insert_with(|| RoleChange::new(ChangeType::Updated))
                    .roles_moved_to_parent
                    .push(*role_id);

                tx.insert_role_event(&role_event).await?;
            }

            // handle the role moved away from the circle on which the
            // command was executed (from the parent down into a child)
            if let Some(mut role_event) = tx
                .circle_changes_applied_role_event(tl, prev_parent.id)
                .await?
            {
                let data = changes_data(&mut role_event);

                data.roles_from_circle.insert(*role_id, parent.id);
                record_move(data, *role_id, prev_parent.id, parent.id);

                // the new parent is a changed child of this circle too
                data.changed_roles
                    .entry(parent.id)
                    .or_insert_with(|| RoleChange::new(ChangeType::Updated))
                    .roles_moved_from_parent
                    .push(*role_id);

                tx.insert_role_event(&role_event).await?;
            }
        }

        // Non-structural events do not contribute to digests for now:
        // domain/accountability changes, member assignments, tensions,
        // member and password updates.
        _ => (),
    }

    Ok(())
}

fn changes_data(role_event: &mut RoleEvent) -> &mut RoleEventCircleChangesApplied {
    match &mut role_event.data {
        RoleEventData::CircleChangesApplied(data) => data,
    }
}

fn record_move(
    data: &mut RoleEventCircleChangesApplied,
    role_id: Uuid,
    previous_parent: Uuid,
    new_parent: Uuid,
) {
    let change = data
        .changed_roles
        .entry(role_id)
        .or_insert_with(|| RoleChange::new(ChangeType::Updated));
    change.moved = Some(RoleParentChange {
        previous_parent,
        new_parent,
    });
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::db::graph::GraphTx;
    use crate::db::test_utils::{circle_created, command_executed, ev, role_created, test_db, uid};
    use crate::db::types::{
        ChangeType, RoleEventCircleChangesApplied, RoleEventData, RoleType, TimeLineNumber,
    };
    use crate::events::{CommandData, EventData};
    use crate::materializer::apply_events;

    async fn changes_digest(
        tx: &mut GraphTx<'_>,
        tl: i64,
        role_id: Uuid,
    ) -> Option<RoleEventCircleChangesApplied> {
        let role_event = tx
            .circle_changes_applied_role_event(TimeLineNumber(tl), role_id)
            .await
            .unwrap()?;
        let RoleEventData::CircleChangesApplied(data) = role_event.data;
        Some(data)
    }

    #[tokio::test]
    async fn child_creation_is_digested_for_the_parent_circle() {
        let db = test_db().await;
        let mut tx = db.begin().await.unwrap();

        let (root, circle, child, issuer) = (uid(1), uid(2), uid(3), uid(9));
        apply_events(
            &mut tx,
            &[
                circle_created(1, 1, root, None, "Root"),
                circle_created(2, 2, circle, Some(root), "Ops"),
                command_executed(3, 3, issuer, CommandData::CircleCreateChildRole { role_id: circle }),
                role_created(3, 3, child, Some(circle), RoleType::Normal, "Scribe"),
            ],
        )
        .await
        .unwrap();

        let data = changes_digest(&mut tx, 3, circle).await.unwrap();
        assert_eq!(data.issuer_id, issuer);
        assert_eq!(data.changed_roles.len(), 1);
        assert_eq!(data.changed_roles[&child].change_type, ChangeType::New);

        // no digest at the previous timelines or for other circles
        assert!(changes_digest(&mut tx, 2, circle).await.is_none());
        assert!(changes_digest(&mut tx, 3, root).await.is_none());
    }

    #[tokio::test]
    async fn changes_outside_a_child_role_command_are_not_digested() {
        let db = test_db().await;
        let mut tx = db.begin().await.unwrap();

        let (root, child) = (uid(1), uid(2));
        apply_events(
            &mut tx,
            &[
                circle_created(1, 1, root, None, "Root"),
                role_created(2, 2, child, Some(root), RoleType::Normal, "Scribe"),
            ],
        )
        .await
        .unwrap();

        assert!(changes_digest(&mut tx, 2, root).await.is_none());
    }

    #[tokio::test]
    async fn creation_and_deletion_in_one_commit_cancel_out() {
        let db = test_db().await;
        let mut tx = db.begin().await.unwrap();

        let (root, circle, child, issuer) = (uid(1), uid(2), uid(3), uid(9));
        apply_events(
            &mut tx,
            &[
                circle_created(1, 1, root, None, "Root"),
                circle_created(2, 2, circle, Some(root), "Ops"),
                command_executed(3, 3, issuer, CommandData::CircleCreateChildRole { role_id: circle }),
                role_created(3, 3, child, Some(circle), RoleType::Normal, "Scribe"),
                ev(3, 3, child, EventData::RoleDeleted { role_id: child }),
            ],
        )
        .await
        .unwrap();

        let data = changes_digest(&mut tx, 3, circle).await.unwrap();
        assert!(data.changed_roles.is_empty());

        // the role was never visible at any timeline
        assert!(tx.role(TimeLineNumber(3), child).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deletion_of_an_existing_child_is_digested() {
        let db = test_db().await;
        let mut tx = db.begin().await.unwrap();

        let (root, circle, child, issuer) = (uid(1), uid(2), uid(3), uid(9));
        apply_events(
            &mut tx,
            &[
                circle_created(1, 1, root, None, "Root"),
                circle_created(2, 2, circle, Some(root), "Ops"),
                role_created(3, 3, child, Some(circle), RoleType::Normal, "Scribe"),
                command_executed(4, 4, issuer, CommandData::CircleDeleteChildRole { role_id: circle }),
                ev(4, 4, child, EventData::RoleDeleted { role_id: child }),
            ],
        )
        .await
        .unwrap();

        let data = changes_digest(&mut tx, 4, circle).await.unwrap();
        assert_eq!(data.changed_roles[&child].change_type, ChangeType::Deleted);
    }

    #[tokio::test]
    async fn updates_of_the_root_role_are_not_digested() {
        let db = test_db().await;
        let mut tx = db.begin().await.unwrap();

        let (root, issuer) = (uid(1), uid(9));
        apply_events(
            &mut tx,
            &[
                circle_created(1, 1, root, None, "Root"),
                command_executed(2, 2, issuer, CommandData::CircleUpdateChildRole { role_id: root }),
                ev(
                    2,
                    2,
                    root,
                    EventData::RoleUpdated {
                        role_id: root,
                        role_type: RoleType::Circle,
                        name: "Root renamed".to_owned(),
                        purpose: String::new(),
                    },
                ),
            ],
        )
        .await
        .unwrap();

        let data = changes_digest(&mut tx, 2, root).await.unwrap();
        assert!(data.changed_roles.is_empty());
    }

    #[tokio::test]
    async fn parent_changes_are_digested_for_both_circles() {
        let db = test_db().await;
        let mut tx = db.begin().await.unwrap();

        // root ─ source ─ moved
        //   └─── target
        let (root, source, target, moved, issuer) = (uid(1), uid(2), uid(3), uid(4), uid(9));
        apply_events(
            &mut tx,
            &[
                circle_created(1, 1, root, None, "Root"),
                circle_created(2, 2, source, Some(root), "Source"),
                circle_created(3, 3, target, Some(root), "Target"),
                role_created(4, 4, moved, Some(source), RoleType::Normal, "Moved"),
                // the command is executed on the old parent circle
                command_executed(5, 5, issuer, CommandData::CircleUpdateChildRole { role_id: source }),
                ev(
                    5,
                    5,
                    moved,
                    EventData::RoleChangedParent {
                        role_id: moved,
                        parent_role_id: Some(target),
                    },
                ),
            ],
        )
        .await
        .unwrap();

        let data = changes_digest(&mut tx, 5, source).await.unwrap();

        assert_eq!(data.roles_from_circle[&moved], target);
        let change = &data.changed_roles[&moved];
        assert_eq!(change.change_type, ChangeType::Updated);
        let parent_change = change.moved.unwrap();
        assert_eq!(parent_change.previous_parent, source);
        assert_eq!(parent_change.new_parent, target);
        assert_eq!(
            data.changed_roles[&target].roles_moved_from_parent,
            vec![moved]
        );

        // the new parent was not the command target, it carries no digest
        assert!(changes_digest(&mut tx, 5, target).await.is_none());
    }
}
