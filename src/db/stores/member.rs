// SPDX-License-Identifier: AGPL-3.0-or-later

//! Member queries: lookups, search, external-identity linkage and the
//! derived circle↔member rollups.
use std::collections::{HashMap, HashSet};

use sqlx::query_scalar;
use uuid::Uuid;

use crate::db::errors::StoreError;
use crate::db::graph::{Direction, GraphTx};
use crate::db::models::{parse_id, MemberAvatarRow, MemberRow, RoleRow};
use crate::db::schema::EdgeClass;
use crate::db::stores::role::id_in_condition;
use crate::db::types::{
    CircleMemberEdge, Member, MemberAvatar, MemberCircleEdge, MemberRoleEdge, Role, RoleType,
    TimeLineNumber,
};
use crate::db::MAX_FETCH_SIZE;

impl GraphTx<'_> {
    /// Look a single member up.
    pub async fn member(
        &mut self,
        tl: TimeLineNumber,
        id: Uuid,
    ) -> Result<Option<Member>, StoreError> {
        let mut members = self
            .vertices::<MemberRow>(tl, Some("member.id = $1"), &[id.to_string()], &[], None)
            .await?;

        Ok(members.pop())
    }

    /// All members, or the given ones, ordered by full name.
    pub async fn members_by_ids(
        &mut self,
        tl: TimeLineNumber,
        member_ids: &[Uuid],
    ) -> Result<Vec<Member>, StoreError> {
        let condition = if member_ids.is_empty() {
            None
        } else {
            Some(id_in_condition("member", member_ids))
        };

        self.vertices::<MemberRow>(tl, condition.as_deref(), &[], &["member.fullname"], None)
            .await
    }

    /// Paginated member listing ordered by full name, optionally restricted
    /// by a case-insensitive substring match against full name or user name.
    pub async fn members(
        &mut self,
        tl: TimeLineNumber,
        search: Option<&str>,
        first: Option<i64>,
        after: Option<&str>,
    ) -> Result<(Vec<Member>, bool), StoreError> {
        let first = match first {
            Some(first) if first > 0 => first,
            _ => MAX_FETCH_SIZE,
        };

        let mut conditions: Vec<String> = Vec::new();
        let mut binds: Vec<String> = Vec::new();

        if let Some(after) = after {
            binds.push(after.to_owned());
            conditions.push(format!("member.fullname > ${}", binds.len()));
        }
        if let Some(search) = search {
            if !search.is_empty() {
                binds.push(search.to_owned());
                let first_bind = binds.len();
                binds.push(search.to_owned());
                let second_bind = binds.len();
                conditions.push(format!(
                    "(lower(member.fullname) LIKE '%' || lower(${}) || '%' \
                     OR lower(member.username) LIKE '%' || lower(${}) || '%')",
                    first_bind, second_bind
                ));
            }
        }

        let condition = if conditions.is_empty() {
            None
        } else {
            Some(conditions.join(" AND "))
        };

        // ask for first + 1 members to know if there are more members
        let mut members = self
            .vertices::<MemberRow>(
                tl,
                condition.as_deref(),
                &binds,
                &["member.fullname"],
                Some(first + 1),
            )
            .await?;

        let has_more = members.len() as i64 > first;
        members.truncate(first as usize);

        Ok((members, has_more))
    }

    /// Look a member up by user name.
    pub async fn member_by_user_name(
        &mut self,
        tl: TimeLineNumber,
        user_name: &str,
    ) -> Result<Option<Member>, StoreError> {
        let mut members = self
            .vertices::<MemberRow>(
                tl,
                Some("member.username = $1"),
                &[user_name.to_owned()],
                &[],
                None,
            )
            .await?;

        Ok(members.pop())
    }

    /// Look a member up by email.
    pub async fn member_by_email(
        &mut self,
        tl: TimeLineNumber,
        email: &str,
    ) -> Result<Option<Member>, StoreError> {
        let mut members = self
            .vertices::<MemberRow>(tl, Some("member.email = $1"), &[email.to_owned()], &[], None)
            .await?;

        Ok(members.pop())
    }

    /// The avatar of a member, sharing the member's id.
    pub async fn member_avatar(
        &mut self,
        tl: TimeLineNumber,
        member_id: Uuid,
    ) -> Result<Option<MemberAvatar>, StoreError> {
        let mut avatars = self
            .vertices::<MemberAvatarRow>(
                tl,
                Some("memberavatar.id = $1"),
                &[member_id.to_string()],
                &[],
                None,
            )
            .await?;

        Ok(avatars.pop())
    }

    /// The external-identity match uid linked to a member, when present.
    pub async fn member_match_uid(
        &mut self,
        member_id: Uuid,
    ) -> Result<Option<String>, StoreError> {
        query_scalar("SELECT matchuid FROM membermatch WHERE memberid = $1")
            .bind(member_id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))
    }

    /// Resolve an external-identity match uid to the member at the current
    /// timeline.
    pub async fn member_by_match_uid(
        &mut self,
        match_uid: &str,
    ) -> Result<Option<Member>, StoreError> {
        let member_id: Option<String> =
            query_scalar("SELECT memberid FROM membermatch WHERE matchuid = $1")
                .bind(match_uid.to_owned())
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(|e| StoreError::Transaction(e.to_string()))?;

        let member_id = match member_id {
            Some(member_id) => parse_id(&member_id),
            None => return Ok(None),
        };

        let tl = self.cur_time_line().number();
        self.member(tl, member_id).await
    }

    /// The roles each given member fills, with the edge attributes.
    pub async fn member_role_edges(
        &mut self,
        tl: TimeLineNumber,
        member_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<MemberRoleEdge>>, StoreError> {
        self.member_role_edges_at(tl, member_ids).await
    }

    /// The circles each given member is a direct member of.
    pub(crate) async fn direct_member_circles(
        &mut self,
        tl: TimeLineNumber,
        member_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Role>>, StoreError> {
        self.connected_vertices::<RoleRow>(
            tl,
            member_ids,
            EdgeClass::CircleDirectMember,
            Direction::Out,
            None,
            &[],
        )
        .await
    }

    /// The direct members of each given circle.
    pub async fn circle_direct_members(
        &mut self,
        tl: TimeLineNumber,
        role_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Member>>, StoreError> {
        self.connected_vertices::<MemberRow>(
            tl,
            role_ids,
            EdgeClass::CircleDirectMember,
            Direction::In,
            None,
            &[],
        )
        .await
    }

    /// The aggregate member→circle rollup.
    ///
    /// For each member, one edge per circle the member belongs to: directly,
    /// by filling a child role, or by filling the rep link of a sub circle
    /// (which bridges the member into the grandparent circle).
    pub async fn member_circle_edges(
        &mut self,
        tl: TimeLineNumber,
        member_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<MemberCircleEdge>>, StoreError> {
        let mut edges_map: HashMap<Uuid, HashMap<Uuid, MemberCircleEdge>> =
            member_ids.iter().map(|id| (*id, HashMap::new())).collect();

        // Add directly defined circles
        let direct_groups = self.direct_member_circles(tl, member_ids).await?;
        for member_id in member_ids {
            for role in direct_groups.get(member_id).into_iter().flatten() {
                edges_map
                    .get_mut(member_id)
                    .unwrap()
                    .entry(role.id)
                    .or_insert_with(|| MemberCircleEdge {
                        role: role.clone(),
                        ..Default::default()
                    })
                    .is_direct_member = true;
            }
        }

        // Get filled roles
        let member_role_edges_groups = self.member_role_edges_at(tl, member_ids).await?;

        let role_ids: Vec<Uuid> = member_role_edges_groups
            .values()
            .flatten()
            .map(|edge| edge.role.id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        // We need the role parents, and the parents of the parents for the
        // rep link fillers
        let mut parent_map: HashMap<Uuid, Role> = self.role_parent(tl, &role_ids).await?;
        let parent_ids: Vec<Uuid> = parent_map
            .values()
            .map(|parent| parent.id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let sub_parent_map = self.role_parent(tl, &parent_ids).await?;
        parent_map.extend(sub_parent_map);

        // Add role fillers (except the ones set as no core member)
        for member_id in member_ids {
            for member_role_edge in member_role_edges_groups.get(member_id).into_iter().flatten() {
                if member_role_edge.no_core_member {
                    continue;
                }
                let role = &member_role_edge.role;
                let parent = match parent_map.get(&role.id) {
                    Some(parent) => parent,
                    None => continue,
                };
                let edge = edges_map
                    .get_mut(member_id)
                    .unwrap()
                    .entry(parent.id)
                    .or_insert_with(|| MemberCircleEdge {
                        role: parent.clone(),
                        ..Default::default()
                    });
                edge.filled_roles.push(role.clone());
                if role.role_type == RoleType::LeadLink {
                    edge.is_lead_link = true;
                }
            }
        }

        // Add sub circles rep link fillers
        for member_id in member_ids {
            for member_role_edge in member_role_edges_groups.get(member_id).into_iter().flatten() {
                if member_role_edge.role.role_type != RoleType::RepLink {
                    continue;
                }
                let parent = match parent_map.get(&member_role_edge.role.id) {
                    Some(parent) => parent,
                    None => continue,
                };
                let parent_parent = match parent_map.get(&parent.id) {
                    Some(parent_parent) => parent_parent,
                    None => continue,
                };
                edges_map
                    .get_mut(member_id)
                    .unwrap()
                    .entry(parent_parent.id)
                    .or_insert_with(|| MemberCircleEdge {
                        role: parent_parent.clone(),
                        ..Default::default()
                    })
                    .rep_link
                    .push(parent.clone());
            }
        }

        let mut member_circle_edges: HashMap<Uuid, Vec<MemberCircleEdge>> = HashMap::new();
        for member_id in member_ids {
            let mut edges: Vec<MemberCircleEdge> = edges_map
                .remove(member_id)
                .unwrap_or_default()
                .into_values()
                .collect();
            for edge in edges.iter_mut() {
                edge.is_core_member = edge.is_direct_member
                    || !edge.filled_roles.is_empty()
                    || !edge.rep_link.is_empty();
            }

            // sort by circle to get repeatable ordered results
            edges.sort_by(|a, b| (&a.role.name, a.role.id).cmp(&(&b.role.name, b.role.id)));
            member_circle_edges.insert(*member_id, edges);
        }

        Ok(member_circle_edges)
    }

    /// Mirror of [`GraphTx::member_circle_edges`], anchored at the circles:
    /// for each circle one edge per member, derived over the circle's child
    /// and grandchild fillers.
    pub async fn circle_member_edges(
        &mut self,
        tl: TimeLineNumber,
        role_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<CircleMemberEdge>>, StoreError> {
        let mut edges_map: HashMap<Uuid, HashMap<Uuid, CircleMemberEdge>> =
            role_ids.iter().map(|id| (*id, HashMap::new())).collect();

        // Add directly defined circle members
        let direct_groups = self.circle_direct_members(tl, role_ids).await?;
        for role_id in role_ids {
            for member in direct_groups.get(role_id).into_iter().flatten() {
                edges_map
                    .get_mut(role_id)
                    .unwrap()
                    .entry(member.id)
                    .or_insert_with(|| CircleMemberEdge {
                        member: member.clone(),
                        ..Default::default()
                    })
                    .is_direct_member = true;
            }
        }

        let childs_groups = self.child_roles_internal(tl, role_ids, &[]).await?;
        let childs_ids: Vec<Uuid> = childs_groups
            .values()
            .flatten()
            .map(|child| child.id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        // We also need the children of the children to get the rep link
        // fillers
        let sub_childs_groups = self.child_roles_internal(tl, &childs_ids, &[]).await?;

        // Merge children and grandchildren into the same list to do just one
        // filler query
        let mut filler_role_ids: HashSet<Uuid> = childs_ids.iter().copied().collect();
        filler_role_ids.extend(sub_childs_groups.values().flatten().map(|child| child.id));
        let filler_role_ids: Vec<Uuid> = filler_role_ids.into_iter().collect();

        let role_member_edges_groups = self.role_member_edges_at(tl, &filler_role_ids).await?;

        // Add role fillers (except the ones set as no core member)
        for role_id in role_ids {
            for child in childs_groups.get(role_id).into_iter().flatten() {
                for role_member_edge in role_member_edges_groups.get(&child.id).into_iter().flatten()
                {
                    if role_member_edge.no_core_member {
                        continue;
                    }
                    let edge = edges_map
                        .get_mut(role_id)
                        .unwrap()
                        .entry(role_member_edge.member.id)
                        .or_insert_with(|| CircleMemberEdge {
                            member: role_member_edge.member.clone(),
                            ..Default::default()
                        });
                    edge.filled_roles.push(child.clone());
                    if child.role_type == RoleType::LeadLink {
                        edge.is_lead_link = true;
                    }
                }
            }
        }

        // Add sub circles rep link fillers
        for role_id in role_ids {
            for child in childs_groups.get(role_id).into_iter().flatten() {
                for sub_child in sub_childs_groups.get(&child.id).into_iter().flatten() {
                    if sub_child.role_type != RoleType::RepLink {
                        continue;
                    }
                    // there must be only one member filling the rep link
                    for role_member_edge in
                        role_member_edges_groups.get(&sub_child.id).into_iter().flatten()
                    {
                        edges_map
                            .get_mut(role_id)
                            .unwrap()
                            .entry(role_member_edge.member.id)
                            .or_insert_with(|| CircleMemberEdge {
                                member: role_member_edge.member.clone(),
                                ..Default::default()
                            })
                            .rep_link
                            .push(child.clone());
                    }
                }
            }
        }

        let mut circle_member_edges: HashMap<Uuid, Vec<CircleMemberEdge>> = HashMap::new();
        for role_id in role_ids {
            let mut edges: Vec<CircleMemberEdge> = edges_map
                .remove(role_id)
                .unwrap_or_default()
                .into_values()
                .collect();
            for edge in edges.iter_mut() {
                edge.is_core_member = edge.is_direct_member
                    || !edge.filled_roles.is_empty()
                    || !edge.rep_link.is_empty();
            }

            // sort by member to get repeatable ordered results
            edges.sort_by(|a, b| {
                (&a.member.full_name, a.member.id).cmp(&(&b.member.full_name, b.member.id))
            });
            circle_member_edges.insert(*role_id, edges);
        }

        Ok(circle_member_edges)
    }
}
