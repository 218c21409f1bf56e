//! SQLite schema migrations for the headword store.
//!
//! Each step runs in its own transaction and bumps both `PRAGMA user_version`
//! and `store_meta.schema_version`, so a store is never left between versions.

use super::schema;
use rusqlite::{Connection, types::Type};
use tracing::info;

/// Latest schema version understood by this binary.
pub const LATEST_SCHEMA_VERSION: u32 = 2;

/// One schema step.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "headwords and edges",
        sql: schema::MIGRATION_V1_SQL,
    },
    Migration {
        version: 2,
        name: "lookup indexes and edge_names view",
        sql: schema::MIGRATION_V2_SQL,
    },
];

/// Stored schema version, from `PRAGMA user_version`.
///
/// # Errors
///
/// Returns an error if the pragma cannot be read or holds a negative value.
pub fn current_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    let raw: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    u32::try_from(raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(err)))
}

/// Steps a store at `version` still needs, oldest first.
pub fn pending(version: u32) -> impl Iterator<Item = &'static Migration> {
    MIGRATIONS.iter().filter(move |step| step.version > version)
}

/// Bring the store up to [`LATEST_SCHEMA_VERSION`] and return the version
/// it ends at. Already-applied steps are skipped.
///
/// # Errors
///
/// Returns an error if any step fails; earlier steps stay committed.
pub fn migrate(conn: &mut Connection) -> rusqlite::Result<u32> {
    let start = current_schema_version(conn)?;
    let mut reached = start;

    for step in pending(start) {
        let version = i64::from(step.version);
        let tx = conn.transaction()?;
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", version)?;
        tx.execute(
            "UPDATE store_meta SET schema_version = ?1 WHERE id = 1",
            [version],
        )?;
        tx.commit()?;
        info!(version = step.version, name = step.name, "store schema migrated");
        reached = step.version;
    }

    Ok(reached)
}
