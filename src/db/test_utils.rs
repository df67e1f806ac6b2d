// SPDX-License-Identifier: AGPL-3.0-or-later

//! Helpers for the test suite: an in-memory sqlite database with the
//! projection tables applied, plus builders for domain events.
//!
//! Schema migrations are out of scope for this crate, production embedders
//! own the schema; the DDL below exists only so the tests have tables to
//! run against.
use once_cell::sync::Lazy;
use serde::Deserialize;
use sqlx::any::AnyPoolOptions;
use sqlx::query;
use uuid::Uuid;

use crate::db::types::RoleType;
use crate::db::{Pool, SqlStore};
use crate::events::{Command, CommandData, Event, EventData};

/// Configuration used in test helper methods.
#[derive(Deserialize, Debug)]
#[serde(default)]
struct TestConfiguration {
    /// Database url (sqlite or postgres).
    database_url: String,
}

impl TestConfiguration {
    fn new() -> Self {
        envy::from_env::<TestConfiguration>()
            .expect("Could not read environment variables for test configuration")
    }
}

impl Default for TestConfiguration {
    fn default() -> Self {
        Self {
            // SQLite database stored in memory.
            database_url: "sqlite::memory:".into(),
        }
    }
}

static TEST_CONFIG: Lazy<TestConfiguration> = Lazy::new(TestConfiguration::new);

const SCHEMA: &str = "
    CREATE TABLE timeline (timestamp BIGINT PRIMARY KEY, groupid TEXT, aggregatetype TEXT, aggregateid TEXT);
    CREATE TABLE role (id TEXT, start_tl BIGINT, end_tl BIGINT, roletype TEXT, depth BIGINT, name TEXT, purpose TEXT);
    CREATE TABLE domain (id TEXT, start_tl BIGINT, end_tl BIGINT, description TEXT);
    CREATE TABLE accountability (id TEXT, start_tl BIGINT, end_tl BIGINT, description TEXT);
    CREATE TABLE roleadditionalcontent (id TEXT, start_tl BIGINT, end_tl BIGINT, content TEXT);
    CREATE TABLE member (id TEXT, start_tl BIGINT, end_tl BIGINT, isadmin BOOLEAN, username TEXT, fullname TEXT, email TEXT);
    CREATE TABLE memberavatar (id TEXT, start_tl BIGINT, end_tl BIGINT, image TEXT);
    CREATE TABLE tension (id TEXT, start_tl BIGINT, end_tl BIGINT, title TEXT, description TEXT, closed BOOLEAN, closereason TEXT);
    CREATE TABLE rolerole (start_tl BIGINT, end_tl BIGINT, x TEXT, y TEXT);
    CREATE TABLE roledomain (start_tl BIGINT, end_tl BIGINT, x TEXT, y TEXT);
    CREATE TABLE roleaccountability (start_tl BIGINT, end_tl BIGINT, x TEXT, y TEXT);
    CREATE TABLE rolemember (start_tl BIGINT, end_tl BIGINT, x TEXT, y TEXT, focus TEXT, nocoremember BOOLEAN, electionexpiration BIGINT);
    CREATE TABLE circledirectmember (start_tl BIGINT, end_tl BIGINT, x TEXT, y TEXT);
    CREATE TABLE membertension (start_tl BIGINT, end_tl BIGINT, x TEXT, y TEXT);
    CREATE TABLE roletension (start_tl BIGINT, end_tl BIGINT, x TEXT, y TEXT);
    CREATE TABLE password (memberid TEXT PRIMARY KEY, password TEXT);
    CREATE TABLE membermatch (matchuid TEXT PRIMARY KEY, memberid TEXT);
    CREATE TABLE roleevent (id TEXT, timeline BIGINT, roleid TEXT, eventtype TEXT, data TEXT);
";

/// Create the test database and apply the schema.
///
/// The pool is limited to a single connection: an in-memory sqlite database
/// lives and dies with its connection.
pub(crate) async fn initialize_db() -> Pool {
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .connect(&TEST_CONFIG.database_url)
        .await
        .unwrap();

    for statement in SCHEMA.split(';') {
        if statement.trim().is_empty() {
            continue;
        }
        query(statement).execute(&pool).await.unwrap();
    }

    pool
}

/// Create a store around a fresh test database.
pub(crate) async fn test_db() -> SqlStore {
    SqlStore::new(initialize_db().await)
}

/// Deterministic id from a small number, for readable fixtures.
pub(crate) fn uid(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

/// An event inside the group `group`, at nanosecond timestamp `ts`.
pub(crate) fn ev(group: u128, ts: i64, aggregate_id: Uuid, data: EventData) -> Event {
    Event {
        id: Uuid::new_v4(),
        group_id: Some(uid(group)),
        aggregate_type: "rolestree".to_owned(),
        aggregate_id,
        timestamp: ts,
        data,
    }
}

pub(crate) fn role_created(
    group: u128,
    ts: i64,
    role_id: Uuid,
    parent_role_id: Option<Uuid>,
    role_type: RoleType,
    name: &str,
) -> Event {
    ev(
        group,
        ts,
        role_id,
        EventData::RoleCreated {
            role_id,
            role_type,
            name: name.to_owned(),
            purpose: String::new(),
            parent_role_id,
        },
    )
}

pub(crate) fn circle_created(
    group: u128,
    ts: i64,
    role_id: Uuid,
    parent_role_id: Option<Uuid>,
    name: &str,
) -> Event {
    role_created(group, ts, role_id, parent_role_id, RoleType::Circle, name)
}

pub(crate) fn member_created(
    group: u128,
    ts: i64,
    member_id: Uuid,
    user_name: &str,
    full_name: &str,
) -> Event {
    let mut event = ev(
        group,
        ts,
        member_id,
        EventData::MemberCreated {
            is_admin: false,
            user_name: user_name.to_owned(),
            full_name: full_name.to_owned(),
            email: format!("{}@example.com", user_name),
        },
    );
    event.aggregate_type = "member".to_owned();
    event
}

pub(crate) fn command_executed(
    group: u128,
    ts: i64,
    issuer_id: Uuid,
    data: CommandData,
) -> Event {
    let aggregate_id = match &data {
        CommandData::CircleCreateChildRole { role_id }
        | CommandData::CircleUpdateChildRole { role_id }
        | CommandData::CircleDeleteChildRole { role_id } => *role_id,
        CommandData::Other => Uuid::new_v4(),
    };

    ev(
        group,
        ts,
        aggregate_id,
        EventData::CommandExecuted {
            command: Command { issuer_id, data },
        },
    )
}
