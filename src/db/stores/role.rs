// SPDX-License-Identifier: AGPL-3.0-or-later

//! Role queries: the role tree, attached domains and accountabilities,
//! additional content and per-role fillers.
use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::db::errors::StoreError;
use crate::db::graph::{Direction, GraphTx};
use crate::db::models::{AccountabilityRow, DomainRow, RoleAdditionalContentRow, RoleRow};
use crate::db::schema::EdgeClass;
use crate::db::types::{
    Accountability, Domain, Role, RoleAdditionalContent, RoleMemberEdge, RoleType, TimeLineNumber,
};

impl GraphTx<'_> {
    /// The unique role with depth 0. Fails when more than one exists.
    pub async fn root_role(&mut self, tl: TimeLineNumber) -> Result<Option<Role>, StoreError> {
        let mut roles = self
            .vertices::<RoleRow>(tl, Some("role.depth = 0"), &[], &[], None)
            .await?;

        if roles.len() > 1 {
            return Err(StoreError::InvariantViolated(
                "too many root roles. This shouldn't happen!".to_owned(),
            ));
        }

        Ok(roles.pop())
    }

    /// Look a single role up.
    pub async fn role(
        &mut self,
        tl: TimeLineNumber,
        id: Uuid,
    ) -> Result<Option<Role>, StoreError> {
        let mut roles = self
            .vertices::<RoleRow>(tl, Some("role.id = $1"), &[id.to_string()], &[], None)
            .await?;

        Ok(roles.pop())
    }

    /// All roles, or the given ones, ordered by name.
    pub async fn roles(
        &mut self,
        tl: TimeLineNumber,
        role_ids: &[Uuid],
    ) -> Result<Vec<Role>, StoreError> {
        let condition = if role_ids.is_empty() {
            None
        } else {
            Some(id_in_condition("role", role_ids))
        };

        self.vertices::<RoleRow>(tl, condition.as_deref(), &[], &["role.name"], None)
            .await
    }

    pub(crate) async fn child_roles_internal(
        &mut self,
        tl: TimeLineNumber,
        role_ids: &[Uuid],
        order_by: &[&str],
    ) -> Result<HashMap<Uuid, Vec<Role>>, StoreError> {
        self.connected_vertices::<RoleRow>(
            tl,
            role_ids,
            EdgeClass::RoleRole,
            Direction::Out,
            None,
            order_by,
        )
        .await
    }

    /// The direct children of each given role, ordered by name.
    pub async fn child_roles(
        &mut self,
        tl: TimeLineNumber,
        role_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Role>>, StoreError> {
        self.child_roles_internal(tl, role_ids, &["role.name"]).await
    }

    /// The parent of each given role. Roles form a tree, so there is at most
    /// one parent per id.
    pub async fn role_parent(
        &mut self,
        tl: TimeLineNumber,
        role_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Role>, StoreError> {
        let groups = self
            .connected_vertices::<RoleRow>(
                tl,
                role_ids,
                EdgeClass::RoleRole,
                Direction::In,
                None,
                &[],
            )
            .await?;

        Ok(groups
            .into_iter()
            .filter_map(|(id, mut parents)| parents.pop().map(|parent| (id, parent)))
            .collect())
    }

    /// The full ancestor chain of each given role, nearest parent first,
    /// terminating at the root. Linear in the chain length.
    pub async fn role_parents(
        &mut self,
        tl: TimeLineNumber,
        role_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Role>>, StoreError> {
        let mut parents: HashMap<Uuid, Role> = self.role_parent(tl, role_ids).await?;

        loop {
            // collect roles with unknown parent
            let needed: Vec<Uuid> = parents
                .values()
                .filter(|parent| !parents.contains_key(&parent.id))
                .map(|parent| parent.id)
                .collect::<HashSet<_>>()
                .into_iter()
                .collect();

            let role_parent_groups = self.role_parent(tl, &needed).await?;
            if role_parent_groups.is_empty() {
                break;
            }
            parents.extend(role_parent_groups);
        }

        let mut chains: HashMap<Uuid, Vec<Role>> = HashMap::new();
        for id in role_ids {
            let chain = chains.entry(*id).or_default();
            let mut cur_id = *id;
            while let Some(parent) = parents.get(&cur_id) {
                chain.push(parent.clone());
                cur_id = parent.id;
            }
        }

        Ok(chains)
    }

    /// The core role of the given type under each given circle.
    pub async fn circle_core_role(
        &mut self,
        tl: TimeLineNumber,
        role_type: RoleType,
        role_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Role>, StoreError> {
        let condition = format!("role.roletype = '{}'", role_type.as_str());
        let groups = self
            .connected_vertices::<RoleRow>(
                tl,
                role_ids,
                EdgeClass::RoleRole,
                Direction::Out,
                Some(&condition),
                &[],
            )
            .await?;

        Ok(groups
            .into_iter()
            .filter_map(|(id, mut roles)| roles.pop().map(|role| (id, role)))
            .collect())
    }

    /// The domains attached to each given role.
    pub async fn role_domains(
        &mut self,
        tl: TimeLineNumber,
        role_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Domain>>, StoreError> {
        self.connected_vertices::<DomainRow>(
            tl,
            role_ids,
            EdgeClass::RoleDomain,
            Direction::In,
            None,
            &[],
        )
        .await
    }

    /// The accountabilities attached to each given role.
    pub async fn role_accountabilities(
        &mut self,
        tl: TimeLineNumber,
        role_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Accountability>>, StoreError> {
        self.connected_vertices::<AccountabilityRow>(
            tl,
            role_ids,
            EdgeClass::RoleAccountability,
            Direction::In,
            None,
            &[],
        )
        .await
    }

    /// The additional content of each given role, keyed by role id.
    pub async fn roles_additional_content(
        &mut self,
        tl: TimeLineNumber,
        role_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, RoleAdditionalContent>, StoreError> {
        let condition = id_in_condition("roleadditionalcontent", role_ids);
        let contents = self
            .vertices::<RoleAdditionalContentRow>(tl, Some(&condition), &[], &[], None)
            .await?;

        Ok(contents
            .into_iter()
            .map(|content| (content.id, content))
            .collect())
    }

    /// The fillers of each given role with their edge attributes.
    pub async fn role_member_edges(
        &mut self,
        tl: TimeLineNumber,
        role_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<RoleMemberEdge>>, StoreError> {
        self.role_member_edges_at(tl, role_ids).await
    }
}

/// Render an `IN` condition over a table's id column.
pub(crate) fn id_in_condition(table: &str, ids: &[Uuid]) -> String {
    let list = ids
        .iter()
        .map(|id| format!("'{}'", id))
        .collect::<Vec<_>>()
        .join(", ");

    format!("{}.id IN ({})", table, list)
}

#[cfg(test)]
mod tests {
    use crate::db::errors::StoreError;
    use crate::db::test_utils::{circle_created, ev, test_db, uid};
    use crate::db::types::TimeLineNumber;
    use crate::events::EventData;
    use crate::materializer::apply_events;

    #[tokio::test]
    async fn more_than_one_root_role_violates_the_tree_invariant() {
        let db = test_db().await;
        let mut tx = db.begin().await.unwrap();

        apply_events(
            &mut tx,
            &[
                circle_created(1, 1, uid(1), None, "Root"),
                circle_created(2, 2, uid(2), None, "Other root"),
            ],
        )
        .await
        .unwrap();

        let err = tx.root_role(TimeLineNumber(2)).await.unwrap_err();
        assert!(matches!(err, StoreError::InvariantViolated(_)), "{:?}", err);

        // at the earlier timeline the tree was still valid
        assert_eq!(
            tx.root_role(TimeLineNumber(1)).await.unwrap().unwrap().id,
            uid(1)
        );
    }

    #[tokio::test]
    async fn domains_and_accountabilities_follow_their_role() {
        let db = test_db().await;
        let mut tx = db.begin().await.unwrap();

        let (root, domain, accountability) = (uid(1), uid(40), uid(41));
        apply_events(
            &mut tx,
            &[
                circle_created(1, 1, root, None, "Root"),
                ev(
                    2,
                    2,
                    root,
                    EventData::RoleDomainCreated {
                        domain_id: domain,
                        role_id: root,
                        description: "all the backups".to_owned(),
                    },
                ),
                ev(
                    3,
                    3,
                    root,
                    EventData::RoleAccountabilityCreated {
                        accountability_id: accountability,
                        role_id: root,
                        description: "keeping backups fresh".to_owned(),
                    },
                ),
                ev(
                    4,
                    4,
                    root,
                    EventData::RoleDomainUpdated {
                        domain_id: domain,
                        role_id: root,
                        description: "all the backups and restores".to_owned(),
                    },
                ),
                ev(
                    5,
                    5,
                    root,
                    EventData::RoleDomainDeleted {
                        domain_id: domain,
                        role_id: root,
                    },
                ),
            ],
        )
        .await
        .unwrap();

        let domains = tx.role_domains(TimeLineNumber(2), &[root]).await.unwrap();
        assert_eq!(domains[&root][0].description, "all the backups");

        let domains = tx.role_domains(TimeLineNumber(4), &[root]).await.unwrap();
        assert_eq!(domains[&root][0].description, "all the backups and restores");

        // deleted at 5, history untouched
        assert!(tx
            .role_domains(TimeLineNumber(5), &[root])
            .await
            .unwrap()
            .is_empty());

        let accountabilities = tx
            .role_accountabilities(TimeLineNumber(5), &[root])
            .await
            .unwrap();
        assert_eq!(
            accountabilities[&root][0].description,
            "keeping backups fresh"
        );
    }

    #[tokio::test]
    async fn additional_content_shares_the_role_id() {
        let db = test_db().await;
        let mut tx = db.begin().await.unwrap();

        let root = uid(1);
        apply_events(
            &mut tx,
            &[
                circle_created(1, 1, root, None, "Root"),
                ev(
                    2,
                    2,
                    root,
                    EventData::RoleAdditionalContentSet {
                        role_id: root,
                        content: "# charter\nbe kind".to_owned(),
                    },
                ),
            ],
        )
        .await
        .unwrap();

        let contents = tx
            .roles_additional_content(TimeLineNumber(2), &[root])
            .await
            .unwrap();
        assert_eq!(contents[&root].content, "# charter\nbe kind");
        assert_eq!(contents[&root].id, root);

        assert!(tx
            .roles_additional_content(TimeLineNumber(1), &[root])
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn core_roles_are_found_per_circle() {
        use crate::db::test_utils::role_created;
        use crate::db::types::RoleType;

        let db = test_db().await;
        let mut tx = db.begin().await.unwrap();

        apply_events(
            &mut tx,
            &[
                circle_created(1, 1, uid(1), None, "Root"),
                circle_created(2, 2, uid(2), Some(uid(1)), "Ops"),
                role_created(3, 3, uid(3), Some(uid(1)), RoleType::Secretary, "Secretary"),
                role_created(4, 4, uid(4), Some(uid(2)), RoleType::Secretary, "Secretary"),
            ],
        )
        .await
        .unwrap();

        let secretaries = tx
            .circle_core_role(TimeLineNumber(4), RoleType::Secretary, &[uid(1), uid(2)])
            .await
            .unwrap();
        assert_eq!(secretaries[&uid(1)].id, uid(3));
        assert_eq!(secretaries[&uid(2)].id, uid(4));

        assert!(tx
            .circle_core_role(TimeLineNumber(4), RoleType::Facilitator, &[uid(1)])
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn roles_listing_is_ordered_by_name() {
        let db = test_db().await;
        let mut tx = db.begin().await.unwrap();

        apply_events(
            &mut tx,
            &[
                circle_created(1, 1, uid(1), None, "Root"),
                circle_created(2, 2, uid(2), Some(uid(1)), "Zeta"),
                circle_created(3, 3, uid(3), Some(uid(1)), "Alpha"),
            ],
        )
        .await
        .unwrap();

        let roles = tx.roles(TimeLineNumber(3), &[]).await.unwrap();
        let names: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Root", "Zeta"]);

        let subset = tx
            .roles(TimeLineNumber(3), &[uid(2), uid(3)])
            .await
            .unwrap();
        let names: Vec<&str> = subset.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }
}
