// SPDX-License-Identifier: AGPL-3.0-or-later

//! The temporal graph engine.
//!
//! Every vertex and edge row carries an open/close timeline interval: a row
//! is live at timeline `t` when `start_tl <= t` and its `end_tl` is either
//! open (`NULL`) or `>= t`. Writers never update attribute values in place;
//! they close the previous version at `tl - 1` and insert a new open version
//! at `tl`, so any past timeline stays queryable.
//!
//! [`GraphTx`] binds one projection instance to the ambient transaction. The
//! cached current timeline is valid for the whole transaction since only
//! this transaction may advance it, and it enables the hot-query fast path:
//! at the current timeline "live" collapses to a single `end_tl IS NULL`
//! equality instead of a range scan.
use std::collections::HashMap;

use log::debug;
use sqlx::any::{Any, AnyArguments, AnyRow};
use sqlx::{query, query_as, query_scalar, FromRow, Transaction};
use uuid::Uuid;

use crate::db::errors::StoreError;
use crate::db::models::{
    parse_id, AccountabilityRow, DomainRow, EdgeJoinRow, Grouped, MemberAvatarRow, MemberRow,
    RoleAdditionalContentRow, RoleRow, TensionRow,
};
use crate::db::schema::{EdgeClass, VertexClass, EDGE_CLASSES, VERTEX_COLUMNS};
use crate::db::types::{
    Accountability, Domain, Member, MemberAvatar, MemberRoleEdge, Role, RoleAdditionalContent,
    RoleMemberEdge, Tension, TimeLine, TimeLineNumber,
};

/// Traversal direction along an edge class: `Out` anchors at endpoint `x`
/// and yields neighbors at `y`, `In` is the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Out,
    In,
}

/// A query of `sqlx` bind arguments against the generic driver.
type AnyQuery<'q> = sqlx::query::Query<'q, Any, AnyArguments<'q>>;

/// Row types the generic readers can produce, one per vertex class.
///
/// This replaces class-keyed dynamic dispatch: each class gets a monomorphic
/// `FromRow` decoder and output type behind the shared predicate builders.
pub(crate) trait VertexRow: for<'r> FromRow<'r, AnyRow> + Send + Unpin {
    const CLASS: VertexClass;
    type Output: From<Self>;
}

impl VertexRow for RoleRow {
    const CLASS: VertexClass = VertexClass::Role;
    type Output = Role;
}

impl VertexRow for DomainRow {
    const CLASS: VertexClass = VertexClass::Domain;
    type Output = Domain;
}

impl VertexRow for AccountabilityRow {
    const CLASS: VertexClass = VertexClass::Accountability;
    type Output = Accountability;
}

impl VertexRow for RoleAdditionalContentRow {
    const CLASS: VertexClass = VertexClass::RoleAdditionalContent;
    type Output = RoleAdditionalContent;
}

impl VertexRow for MemberRow {
    const CLASS: VertexClass = VertexClass::Member;
    type Output = Member;
}

impl VertexRow for MemberAvatarRow {
    const CLASS: VertexClass = VertexClass::MemberAvatar;
    type Output = MemberAvatar;
}

impl VertexRow for TensionRow {
    const CLASS: VertexClass = VertexClass::Tension;
    type Output = Tension;
}

/// Vertex values the writers can persist, one per vertex class. The id and
/// the temporal columns are provided by the writer, implementations only
/// bind the class-specific attribute columns in schema order.
pub(crate) trait Vertex {
    const CLASS: VertexClass;
    fn bind_attrs<'q>(&'q self, query: AnyQuery<'q>) -> AnyQuery<'q>;
}

impl Vertex for Role {
    const CLASS: VertexClass = VertexClass::Role;

    fn bind_attrs<'q>(&'q self, query: AnyQuery<'q>) -> AnyQuery<'q> {
        query
            .bind(self.role_type.as_str())
            .bind(self.depth)
            .bind(self.name.as_str())
            .bind(self.purpose.as_str())
    }
}

impl Vertex for Domain {
    const CLASS: VertexClass = VertexClass::Domain;

    fn bind_attrs<'q>(&'q self, query: AnyQuery<'q>) -> AnyQuery<'q> {
        query.bind(self.description.as_str())
    }
}

impl Vertex for Accountability {
    const CLASS: VertexClass = VertexClass::Accountability;

    fn bind_attrs<'q>(&'q self, query: AnyQuery<'q>) -> AnyQuery<'q> {
        query.bind(self.description.as_str())
    }
}

impl Vertex for RoleAdditionalContent {
    const CLASS: VertexClass = VertexClass::RoleAdditionalContent;

    fn bind_attrs<'q>(&'q self, query: AnyQuery<'q>) -> AnyQuery<'q> {
        query.bind(self.content.as_str())
    }
}

impl Vertex for Member {
    const CLASS: VertexClass = VertexClass::Member;

    fn bind_attrs<'q>(&'q self, query: AnyQuery<'q>) -> AnyQuery<'q> {
        query
            .bind(self.is_admin)
            .bind(self.user_name.as_str())
            .bind(self.full_name.as_str())
            .bind(self.email.as_str())
    }
}

impl Vertex for MemberAvatar {
    const CLASS: VertexClass = VertexClass::MemberAvatar;

    fn bind_attrs<'q>(&'q self, query: AnyQuery<'q>) -> AnyQuery<'q> {
        query.bind(self.image.as_str())
    }
}

impl Vertex for Tension {
    const CLASS: VertexClass = VertexClass::Tension;

    fn bind_attrs<'q>(&'q self, query: AnyQuery<'q>) -> AnyQuery<'q> {
        query
            .bind(self.title.as_str())
            .bind(self.description.as_str())
            .bind(self.closed)
            .bind(self.close_reason.as_str())
    }
}

/// A projection instance bound to one ambient transaction.
///
/// All reads and writes of the bitemporal graph go through this struct; the
/// transaction is either committed as a whole or rolled back, which also
/// undoes any partially applied event group.
#[derive(Debug)]
pub struct GraphTx<'a> {
    pub(crate) tx: Transaction<'a, Any>,
    pub(crate) cur_tl: TimeLine,
    pub(crate) forced_admin_member_user_name: Option<String>,
}

impl<'a> GraphTx<'a> {
    pub(crate) fn new(tx: Transaction<'a, Any>, cur_tl: TimeLine) -> GraphTx<'a> {
        GraphTx {
            tx,
            cur_tl,
            forced_admin_member_user_name: None,
        }
    }

    /// Commit the ambient transaction.
    pub async fn commit(self) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))
    }

    /// Explicitly roll the ambient transaction back. Dropping the instance
    /// has the same effect.
    pub async fn rollback(self) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))
    }

    /// A member user name which is always treated as admin when resolving
    /// the calling member. Applied in-memory only.
    pub fn set_forced_admin_member_user_name(&mut self, user_name: Option<String>) {
        self.forced_admin_member_user_name = user_name;
    }

    /// Predicate selecting rows live at `tl`. At the current timeline this
    /// collapses to an equality on the open marker.
    pub(crate) fn timeline_cond(&self, table: &str, tl: TimeLineNumber) -> String {
        if tl == self.cur_tl.number() {
            return format!("{}.end_tl IS NULL", table);
        }
        format!(
            "({t}.start_tl <= {n} AND ({t}.end_tl >= {n} OR {t}.end_tl IS NULL))",
            t = table,
            n = tl.0
        )
    }

    /// Predicate selecting the open row to close at `tl`.
    pub(crate) fn last_timeline_cond(&self, table: &str, tl: TimeLineNumber) -> String {
        if tl == self.cur_tl.number() {
            return format!("{}.end_tl IS NULL", table);
        }
        format!(
            "({t}.end_tl IS NULL AND {t}.start_tl <= {n})",
            t = table,
            n = tl.0
        )
    }

    /// Select rows of one vertex class live at `tl`, optionally filtered,
    /// ordered and limited. `condition` may reference `$n` placeholders
    /// resolved against `binds`.
    pub(crate) async fn vertices<V: VertexRow>(
        &mut self,
        tl: TimeLineNumber,
        condition: Option<&str>,
        binds: &[String],
        order_by: &[&str],
        limit: Option<i64>,
    ) -> Result<Vec<V::Output>, StoreError> {
        assert!(tl.0 > 0, "wrong tl sequence {}", tl);

        let table = V::CLASS.table();
        let mut sql = format!(
            "SELECT {} FROM {} WHERE {}",
            vertex_columns_sql(V::CLASS),
            table,
            self.timeline_cond(table, tl)
        );
        if let Some(condition) = condition {
            sql.push_str(&format!(" AND ({})", condition));
        }
        if !order_by.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", order_by.join(", ")));
        }
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut query = query_as::<_, V>(&sql);
        for bind in binds {
            query = query.bind(bind.clone());
        }

        let rows = query
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        Ok(rows.into_iter().map(V::Output::from).collect())
    }

    /// For each source id return the neighbors reachable in one hop along
    /// `edge_class`, as a mapping keyed by the source id. Both the edge row
    /// and the neighbor vertex row must be live at `tl`. A source without
    /// neighbors yields no key.
    pub(crate) async fn connected_vertices<V: VertexRow>(
        &mut self,
        tl: TimeLineNumber,
        source_ids: &[Uuid],
        edge_class: EdgeClass,
        direction: Direction,
        condition: Option<&str>,
        order_by: &[&str],
    ) -> Result<HashMap<Uuid, Vec<V::Output>>, StoreError> {
        assert!(tl.0 > 0, "wrong tl sequence {}", tl);

        if source_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let (neighbor_class, anchor_point, neighbor_point) = match direction {
            Direction::Out => (edge_class.y(), "x", "y"),
            Direction::In => (edge_class.x(), "y", "x"),
        };
        assert_eq!(
            V::CLASS,
            neighbor_class,
            "row type does not match the {:?} endpoint of {:?}",
            direction,
            edge_class
        );

        let vt = neighbor_class.table();
        let et = edge_class.table();

        let mut sql = format!(
            "SELECT {cols}, {et}.{anchor} AS source_id \
             FROM {vt} JOIN {et} ON {vt}.id = {et}.{neighbor} \
             WHERE {et}.{anchor} IN ({ids}) AND {vcond} AND {econd}",
            cols = vertex_columns_sql(neighbor_class),
            et = et,
            vt = vt,
            anchor = anchor_point,
            neighbor = neighbor_point,
            ids = id_list(source_ids),
            vcond = self.timeline_cond(vt, tl),
            econd = self.timeline_cond(et, tl),
        );
        if let Some(condition) = condition {
            sql.push_str(&format!(" AND ({})", condition));
        }
        if !order_by.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", order_by.join(", ")));
        }

        let rows: Vec<Grouped<V>> = query_as(&sql)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        let mut groups: HashMap<Uuid, Vec<V::Output>> = HashMap::new();
        for row in rows {
            groups
                .entry(parse_id(&row.source_id))
                .or_default()
                .push(V::Output::from(row.row));
        }

        Ok(groups)
    }

    /// Variant of [`GraphTx::connected_vertices`] used when the caller only
    /// needs the vertex side, not grouped by anchor.
    pub(crate) async fn vertices_filtered<V: VertexRow>(
        &mut self,
        tl: TimeLineNumber,
        edge_class: EdgeClass,
        direction: Direction,
        anchor_ids: &[Uuid],
        condition: Option<&str>,
    ) -> Result<Vec<V::Output>, StoreError> {
        assert!(tl.0 > 0, "wrong tl sequence {}", tl);

        if anchor_ids.is_empty() {
            return Ok(Vec::new());
        }

        let (vertex_class, anchor_point, vertex_point) = match direction {
            Direction::Out => (edge_class.y(), "x", "y"),
            Direction::In => (edge_class.x(), "y", "x"),
        };
        assert_eq!(
            V::CLASS,
            vertex_class,
            "row type does not match the {:?} endpoint of {:?}",
            direction,
            edge_class
        );

        let vt = vertex_class.table();
        let et = edge_class.table();

        let mut sql = format!(
            "SELECT {cols} FROM {vt} JOIN {et} ON {vt}.id = {et}.{vertex} \
             WHERE {et}.{anchor} IN ({ids}) AND {vcond} AND {econd}",
            cols = vertex_columns_sql(vertex_class),
            vt = vt,
            et = et,
            vertex = vertex_point,
            anchor = anchor_point,
            ids = id_list(anchor_ids),
            vcond = self.timeline_cond(vt, tl),
            econd = self.timeline_cond(et, tl),
        );
        if let Some(condition) = condition {
            sql.push_str(&format!(" AND ({})", condition));
        }

        let rows: Vec<V> = query_as(&sql)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        Ok(rows.into_iter().map(V::Output::from).collect())
    }

    /// The `role↔member` edges of the given roles joined with the member
    /// vertices, so callers can distinguish filler membership from other
    /// edges.
    pub(crate) async fn role_member_edges_at(
        &mut self,
        tl: TimeLineNumber,
        role_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<RoleMemberEdge>>, StoreError> {
        let rows = self
            .member_edge_join_rows::<MemberRow>(tl, role_ids, Direction::In)
            .await?;

        let mut groups: HashMap<Uuid, Vec<RoleMemberEdge>> = HashMap::new();
        for row in rows {
            groups
                .entry(parse_id(&row.source_id))
                .or_default()
                .push(RoleMemberEdge {
                    member: row.row.into(),
                    focus: row.focus,
                    no_core_member: row.no_core_member,
                    election_expiration: row.election_expiration,
                });
        }

        Ok(groups)
    }

    /// Mirror of [`GraphTx::role_member_edges_at`]: the `role↔member` edges
    /// of the given members joined with the role vertices.
    pub(crate) async fn member_role_edges_at(
        &mut self,
        tl: TimeLineNumber,
        member_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<MemberRoleEdge>>, StoreError> {
        let rows = self
            .member_edge_join_rows::<RoleRow>(tl, member_ids, Direction::Out)
            .await?;

        let mut groups: HashMap<Uuid, Vec<MemberRoleEdge>> = HashMap::new();
        for row in rows {
            groups
                .entry(parse_id(&row.source_id))
                .or_default()
                .push(MemberRoleEdge {
                    role: row.row.into(),
                    focus: row.focus,
                    no_core_member: row.no_core_member,
                    election_expiration: row.election_expiration,
                });
        }

        Ok(groups)
    }

    async fn member_edge_join_rows<V: VertexRow>(
        &mut self,
        tl: TimeLineNumber,
        source_ids: &[Uuid],
        direction: Direction,
    ) -> Result<Vec<EdgeJoinRow<V>>, StoreError> {
        assert!(tl.0 > 0, "wrong tl sequence {}", tl);

        if source_ids.is_empty() {
            return Ok(Vec::new());
        }

        let edge_class = EdgeClass::RoleMember;
        let (neighbor_class, anchor_point, neighbor_point) = match direction {
            Direction::Out => (edge_class.y(), "x", "y"),
            Direction::In => (edge_class.x(), "y", "x"),
        };
        assert_eq!(V::CLASS, neighbor_class);

        let vt = neighbor_class.table();
        let et = edge_class.table();

        let sql = format!(
            "SELECT {cols}, {et}.focus AS focus, {et}.nocoremember AS nocoremember, \
             {et}.electionexpiration AS electionexpiration, {et}.{anchor} AS source_id \
             FROM {vt} JOIN {et} ON {vt}.id = {et}.{neighbor} \
             WHERE {et}.{anchor} IN ({ids}) AND {vcond} AND {econd}",
            cols = vertex_columns_sql(neighbor_class),
            et = et,
            vt = vt,
            anchor = anchor_point,
            neighbor = neighbor_point,
            ids = id_list(source_ids),
            vcond = self.timeline_cond(vt, tl),
            econd = self.timeline_cond(et, tl),
        );

        query_as(&sql)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))
    }

    /// Write a new open vertex version at `tl`. No open row may exist for
    /// this `(class, id)`; this low level method does not check.
    pub(crate) async fn insert_vertex<V: Vertex>(
        &mut self,
        tl: TimeLineNumber,
        id: Uuid,
        vertex: &V,
    ) -> Result<(), StoreError> {
        let sql = vertex_insert_sql(V::CLASS);
        let query = query(&sql)
            .bind(id.to_string())
            .bind(tl.0)
            .bind(Option::<i64>::None);

        vertex
            .bind_attrs(query)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        Ok(())
    }

    /// Close the open vertex version, setting its end timeline to `end_tl`
    /// (always the writing operation's timeline minus one).
    ///
    /// The close predicate is keyed by the operation's timeline, not the end
    /// timeline: a row opened by the same commit is closed too and is left
    /// with an empty interval, so it was never live.
    pub(crate) async fn close_vertex(
        &mut self,
        end_tl: TimeLineNumber,
        class: VertexClass,
        id: Uuid,
    ) -> Result<(), StoreError> {
        debug!("closing vertex {} id: {}", class.table(), id);

        let sql = format!(
            "UPDATE {t} SET end_tl = $1 WHERE id = $2 AND {cond}",
            t = class.table(),
            cond = self.last_timeline_cond(class.table(), TimeLineNumber(end_tl.0 + 1))
        );
        query(&sql)
            .bind(end_tl.0)
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        Ok(())
    }

    /// Add a new vertex.
    pub(crate) async fn new_vertex<V: Vertex>(
        &mut self,
        tl: TimeLineNumber,
        id: Uuid,
        vertex: &V,
    ) -> Result<(), StoreError> {
        self.insert_vertex(tl, id, vertex).await
    }

    /// Produce a new live version of a vertex. The previous version remains
    /// queryable at any timeline up to `tl - 1`.
    pub(crate) async fn update_vertex<V: Vertex>(
        &mut self,
        tl: TimeLineNumber,
        id: Uuid,
        vertex: &V,
    ) -> Result<(), StoreError> {
        self.close_vertex(tl.prev(), V::CLASS, id).await?;
        self.insert_vertex(tl, id, vertex).await?;
        Ok(())
    }

    /// Close a vertex. Connected edges are not cascaded: the event applier
    /// knows which edges a deletion implies and closes them explicitly,
    /// [`GraphTx::check_broken_edges`] catches mistakes.
    pub(crate) async fn delete_vertex(
        &mut self,
        tl: TimeLineNumber,
        class: VertexClass,
        id: Uuid,
    ) -> Result<(), StoreError> {
        self.close_vertex(tl.prev(), class, id).await
    }

    /// Insert a new open edge at `tl`.
    pub(crate) async fn add_edge(
        &mut self,
        tl: TimeLineNumber,
        edge_class: EdgeClass,
        x: Uuid,
        y: Uuid,
    ) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO {} (start_tl, end_tl, x, y) VALUES ($1, $2, $3, $4)",
            edge_class.table()
        );
        query(&sql)
            .bind(tl.0)
            .bind(Option::<i64>::None)
            .bind(x.to_string())
            .bind(y.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        Ok(())
    }

    /// Insert a new open `role↔member` edge carrying the filler attributes.
    pub(crate) async fn add_role_member_edge(
        &mut self,
        tl: TimeLineNumber,
        x: Uuid,
        y: Uuid,
        focus: Option<&str>,
        no_core_member: bool,
        election_expiration: Option<i64>,
    ) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO {} (start_tl, end_tl, x, y, focus, nocoremember, electionexpiration) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
            EdgeClass::RoleMember.table()
        );
        query(&sql)
            .bind(tl.0)
            .bind(Option::<i64>::None)
            .bind(x.to_string())
            .bind(y.to_string())
            .bind(focus)
            .bind(no_core_member)
            .bind(election_expiration)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        Ok(())
    }

    /// Close the open edge at the provided end timeline.
    pub(crate) async fn close_edge(
        &mut self,
        end_tl: TimeLineNumber,
        edge_class: EdgeClass,
        x: Uuid,
        y: Uuid,
    ) -> Result<(), StoreError> {
        debug!("closing edge {} x: {}, y: {}", edge_class.table(), x, y);

        let sql = format!(
            "UPDATE {t} SET end_tl = $1 WHERE x = $2 AND y = $3 AND {cond}",
            t = edge_class.table(),
            cond = self.last_timeline_cond(edge_class.table(), TimeLineNumber(end_tl.0 + 1))
        );
        query(&sql)
            .bind(end_tl.0)
            .bind(x.to_string())
            .bind(y.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        Ok(())
    }

    /// Delete the edge. The provided timeline is the timeline of the current
    /// change; internally the edge is closed at `tl - 1`.
    pub(crate) async fn delete_edge(
        &mut self,
        tl: TimeLineNumber,
        edge_class: EdgeClass,
        x: Uuid,
        y: Uuid,
    ) -> Result<(), StoreError> {
        self.close_edge(tl.prev(), edge_class, x, y).await
    }

    /// Walk every edge class at `tl` and verify that no edge live at `tl`
    /// has a dangling endpoint. Fails with a diagnostic naming the edge
    /// class and side.
    pub async fn check_broken_edges(&mut self, tl: TimeLineNumber) -> Result<(), StoreError> {
        debug!("check_broken_edges tl: {}", tl);

        assert!(tl.0 > 0, "wrong tl sequence {}", tl);

        for edge_class in EDGE_CLASSES {
            for (vertex_class, edge_point) in [(edge_class.x(), "x"), (edge_class.y(), "y")] {
                let edge_count: i64 = query_scalar(&format!(
                    "SELECT COUNT(*) FROM {} AS edge WHERE {}",
                    edge_class.table(),
                    self.timeline_cond("edge", tl)
                ))
                .fetch_one(&mut *self.tx)
                .await
                .map_err(|e| StoreError::Transaction(e.to_string()))?;

                let joined_count: i64 = query_scalar(&format!(
                    "SELECT COUNT(*) FROM {et} AS edge \
                     JOIN {vt} AS vertex ON edge.{point} = vertex.id \
                     WHERE {econd} AND {vcond}",
                    et = edge_class.table(),
                    vt = vertex_class.table(),
                    point = edge_point,
                    econd = self.timeline_cond("edge", tl),
                    vcond = self.timeline_cond("vertex", tl),
                ))
                .fetch_one(&mut *self.tx)
                .await
                .map_err(|e| StoreError::Transaction(e.to_string()))?;

                if joined_count != edge_count {
                    return Err(StoreError::BrokenEdges {
                        broken: edge_count - joined_count,
                        edges: edge_count,
                        vertices: joined_count,
                        tl: tl.0,
                        edge_point,
                        edge_class: edge_class.table(),
                        vertex_class: vertex_class.table(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Select list of one vertex class with every column aliased unqualified, so
/// `FromRow` decoding stays join-safe.
fn vertex_columns_sql(class: VertexClass) -> String {
    let table = class.table();

    VERTEX_COLUMNS
        .iter()
        .chain(class.attr_columns())
        .map(|column| format!("{t}.{c} AS {c}", t = table, c = column))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Insert statement of one vertex class with `$n` placeholders for all
/// columns in schema order.
fn vertex_insert_sql(class: VertexClass) -> String {
    let columns: Vec<&str> = VERTEX_COLUMNS
        .iter()
        .chain(class.attr_columns())
        .copied()
        .collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${}", i)).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        class.table(),
        columns.join(", "),
        placeholders.join(", ")
    )
}

/// Render a list of ids for an `IN` clause. Uuids only ever contain hex
/// digits and hyphens.
fn id_list(ids: &[Uuid]) -> String {
    ids.iter()
        .map(|id| format!("'{}'", id))
        .collect::<Vec<_>>()
        .join(", ")
}
