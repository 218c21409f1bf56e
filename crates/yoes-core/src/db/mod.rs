//! SQLite store for headwords and edges.
//!
//! Runtime defaults:
//! - `journal_mode = WAL` so `yoes tree` can read while another process writes
//! - `busy_timeout = 5s` to ride out short lock windows
//! - `foreign_keys = ON` so removing a headword cascades to its edges

pub mod migrations;
pub mod schema;
pub mod sqlite;

pub use sqlite::SqlitePersistence;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{path::Path, time::Duration};
use tracing::debug;

/// Busy timeout used for store connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the store at `path`, creating its directory if needed,
/// and bring it to the latest schema.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, a pragma is rejected, or a
/// migration fails.
pub fn open_store(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create store directory {}", dir.display()))?;
    }
    let conn =
        Connection::open(path).with_context(|| format!("open store {}", path.display()))?;
    prepare(conn)
}

/// A private in-memory store with the same pragmas and schema.
///
/// # Errors
///
/// Returns an error if a pragma is rejected or a migration fails.
pub fn open_in_memory() -> Result<Connection> {
    prepare(Connection::open_in_memory().context("open in-memory store")?)
}

fn prepare(mut conn: Connection) -> Result<Connection> {
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("enable foreign keys")?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .context("set synchronous")?;
    // In-memory databases answer "memory" here; only files switch to WAL.
    let _mode: String = conn
        .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
        .context("set journal mode")?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)
        .context("set busy timeout")?;

    let version = migrations::migrate(&mut conn).context("apply store migrations")?;
    debug!(version, "store ready");
    Ok(conn)
}
