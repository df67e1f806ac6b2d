// SPDX-License-Identifier: AGPL-3.0-or-later

//! Authentication, calling-member resolution and per-circle permission
//! computation.
use sqlx::{query, query_scalar};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::db::errors::{AuthError, StoreError};
use crate::db::graph::{Direction, GraphTx};
use crate::db::models::RoleRow;
use crate::db::schema::EdgeClass;
use crate::db::types::{Member, MemberCirclePermissions, RoleType, TimeLineNumber};
use crate::password::PasswordVerifier;

impl GraphTx<'_> {
    /// The stored password hash of a member. Passwords are point values, not
    /// versioned.
    pub(crate) async fn member_password(
        &mut self,
        member_id: Uuid,
    ) -> Result<Option<String>, StoreError> {
        query_scalar("SELECT password FROM password WHERE memberid = $1")
            .bind(member_id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))
    }

    /// Replace the stored password hash of a member.
    pub(crate) async fn set_member_password(
        &mut self,
        member_id: Uuid,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        query("DELETE FROM password WHERE memberid = $1")
            .bind(member_id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        query("INSERT INTO password (memberid, password) VALUES ($1, $2)")
            .bind(member_id.to_string())
            .bind(password_hash)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        Ok(())
    }

    async fn authenticate(
        &mut self,
        verifier: &dyn PasswordVerifier,
        member: Option<Member>,
        password: &str,
    ) -> Result<Member, AuthError> {
        let member = member.ok_or(AuthError::NoSuchMember)?;

        let cur_password_hash = self
            .member_password(member.id)
            .await?
            .ok_or(AuthError::InvalidPassword)?;

        if !verifier.verify(&cur_password_hash, password)? {
            return Err(AuthError::InvalidPassword);
        }

        Ok(member)
    }

    /// Authenticate a member by id at the current timeline.
    pub async fn authenticate_uid_password(
        &mut self,
        verifier: &dyn PasswordVerifier,
        member_id: Uuid,
        password: &str,
    ) -> Result<Member, AuthError> {
        let tl = self.cur_time_line().number();
        let member = self.member(tl, member_id).await?;

        self.authenticate(verifier, member, password).await
    }

    /// Authenticate a member by user name at the current timeline.
    pub async fn authenticate_user_name_password(
        &mut self,
        verifier: &dyn PasswordVerifier,
        user_name: &str,
        password: &str,
    ) -> Result<Member, AuthError> {
        let tl = self.cur_time_line().number();
        let member = self.member_by_user_name(tl, user_name).await?;

        self.authenticate(verifier, member, password).await
    }

    /// Authenticate a member by email at the current timeline.
    pub async fn authenticate_email_password(
        &mut self,
        verifier: &dyn PasswordVerifier,
        email: &str,
        password: &str,
    ) -> Result<Member, AuthError> {
        let tl = self.cur_time_line().number();
        let member = self.member_by_email(tl, email).await?;

        self.authenticate(verifier, member, password).await
    }

    pub(crate) async fn calling_member_internal(
        &mut self,
        ctx: &RequestContext,
        tl: TimeLineNumber,
    ) -> Result<Member, AuthError> {
        let user_id = ctx.user_id().ok_or(AuthError::MissingUserId)?;
        let user_id: Uuid = user_id
            .parse()
            .map_err(|_| AuthError::InvalidUserId(user_id.to_owned()))?;

        let mut member = self
            .member(tl, user_id)
            .await?
            .ok_or(AuthError::NoSuchMember)?;

        // Set member as admin if defined as forced admin member user name
        if self.forced_admin_member_user_name.as_deref() == Some(member.user_name.as_str()) {
            member.is_admin = true;
        }

        Ok(member)
    }

    /// Resolve the member issuing the current request at the current
    /// timeline.
    pub async fn calling_member(
        &mut self,
        ctx: &RequestContext,
    ) -> Result<(Member, TimeLineNumber), AuthError> {
        let tl = self.cur_time_line().number();
        let member = self.calling_member_internal(ctx, tl).await?;

        Ok((member, tl))
    }

    /// Whether the member fills the lead link role of the given circle: the
    /// unique lead-link child has exactly one filler and it is this member.
    pub(crate) async fn member_is_lead_link(
        &mut self,
        tl: TimeLineNumber,
        member_id: Uuid,
        role_id: Uuid,
    ) -> Result<bool, StoreError> {
        let mut lead_link_roles = self
            .vertices_filtered::<RoleRow>(
                tl,
                EdgeClass::RoleRole,
                Direction::Out,
                &[role_id],
                Some("role.roletype = 'leadlink'"),
            )
            .await?;

        let lead_link_role = match lead_link_roles.pop() {
            Some(role) => role,
            None => return Ok(false),
        };

        let role_member_edges_groups = self.role_member_edges_at(tl, &[lead_link_role.id]).await?;
        let role_member_edges = match role_member_edges_groups.get(&lead_link_role.id) {
            Some(edges) => edges,
            None => return Ok(false),
        };

        // lead link must have at max one assigned member
        Ok(role_member_edges
            .first()
            .map(|edge| edge.member.id == member_id)
            .unwrap_or(false))
    }

    /// Compute the calling member's management permissions at the circle
    /// level. Returns `None` when the target role is not a circle, since the
    /// caller can not know.
    pub async fn member_circle_permissions(
        &mut self,
        ctx: &RequestContext,
        tl: TimeLineNumber,
        role_id: Uuid,
    ) -> Result<Option<MemberCirclePermissions>, AuthError> {
        let calling_member = self.calling_member_internal(ctx, tl).await?;

        let role = self.role(tl, role_id).await?.ok_or_else(|| {
            StoreError::InvariantViolated(format!("role with id {} doesn't exist", role_id))
        })?;
        if role.role_type != RoleType::Circle {
            // don't return an error since the caller can't know if this is a
            // circle or another kind of role
            return Ok(None);
        }

        let parent_groups = self.role_parent(tl, &[role_id]).await?;
        let parent = parent_groups.get(&role.id);

        let is_lead_link = self
            .member_is_lead_link(tl, calling_member.id, role_id)
            .await?;

        let mut permissions = MemberCirclePermissions::default();

        // Only the circle lead link (or an admin) can manage the circle
        if calling_member.is_admin || is_lead_link {
            permissions.assign_child_circle_lead_link = true;
            permissions.assign_circle_core_roles = true;
            permissions.assign_child_role_members = true;
            permissions.assign_circle_direct_members = true;
            permissions.manage_child_roles = true;
            permissions.manage_role_additional_content = true;
        }

        // As a special case, on the root circle its lead link can manage the
        // circle data and its lead link
        if parent.is_none() && (calling_member.is_admin || is_lead_link) {
            permissions.assign_root_circle_lead_link = true;
            permissions.manage_root_circle = true;
        }

        Ok(Some(permissions))
    }
}
