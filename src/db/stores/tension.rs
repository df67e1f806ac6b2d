// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tension queries. Tensions are raised by a member and optionally target a
//! role; only the raising member may list their own tensions.
use std::collections::HashMap;

use uuid::Uuid;

use crate::context::RequestContext;
use crate::db::errors::{AuthError, StoreError};
use crate::db::graph::{Direction, GraphTx};
use crate::db::models::{MemberRow, RoleRow, TensionRow};
use crate::db::schema::EdgeClass;
use crate::db::types::{Member, Role, Tension, TimeLineNumber};

impl GraphTx<'_> {
    /// Look a single tension up.
    pub async fn tension(
        &mut self,
        tl: TimeLineNumber,
        id: Uuid,
    ) -> Result<Option<Tension>, StoreError> {
        let mut tensions = self
            .vertices::<TensionRow>(tl, Some("tension.id = $1"), &[id.to_string()], &[], None)
            .await?;

        Ok(tensions.pop())
    }

    /// The tensions raised by each given member.
    ///
    /// Only the member itself can see its tensions: returns `None` unless
    /// every queried id equals the calling member.
    pub async fn member_tensions(
        &mut self,
        ctx: &RequestContext,
        tl: TimeLineNumber,
        member_ids: &[Uuid],
    ) -> Result<Option<HashMap<Uuid, Vec<Tension>>>, AuthError> {
        let member = self.calling_member_internal(ctx, tl).await?;

        if !member_ids.iter().all(|member_id| *member_id == member.id) {
            return Ok(None);
        }

        let tensions_groups = self
            .connected_vertices::<TensionRow>(
                tl,
                member_ids,
                EdgeClass::MemberTension,
                Direction::In,
                None,
                &[],
            )
            .await?;

        Ok(Some(tensions_groups))
    }

    /// The member which raised each given tension.
    pub async fn tension_member(
        &mut self,
        tl: TimeLineNumber,
        tension_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Member>, StoreError> {
        let groups = self
            .connected_vertices::<MemberRow>(
                tl,
                tension_ids,
                EdgeClass::MemberTension,
                Direction::Out,
                None,
                &[],
            )
            .await?;

        Ok(groups
            .into_iter()
            .filter_map(|(id, mut members)| members.pop().map(|member| (id, member)))
            .collect())
    }

    /// The tensions targeting each given role.
    pub async fn role_tensions(
        &mut self,
        tl: TimeLineNumber,
        role_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Tension>>, StoreError> {
        self.connected_vertices::<TensionRow>(
            tl,
            role_ids,
            EdgeClass::RoleTension,
            Direction::In,
            None,
            &[],
        )
        .await
    }

    /// The role each given tension targets, when any.
    pub async fn tension_role(
        &mut self,
        tl: TimeLineNumber,
        tension_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Role>, StoreError> {
        let groups = self
            .connected_vertices::<RoleRow>(
                tl,
                tension_ids,
                EdgeClass::RoleTension,
                Direction::Out,
                None,
                &[],
            )
            .await?;

        Ok(groups
            .into_iter()
            .filter_map(|(id, mut roles)| roles.pop().map(|role| (id, role)))
            .collect())
    }
}
