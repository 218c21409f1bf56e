//! [`Persistence`] backed by a SQLite connection.
//!
//! Rows are keyed by [`headword_key`], so callers may pass any spelling of a
//! name. Edge kinds are stored as their integer codes.

#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

use crate::model::{Edge, EdgeKind, Headword, Level, headword_key};
use crate::persist::Persistence;
use crate::store::EdgeCommit;

/// SQLite implementation of [`Persistence`].
#[derive(Debug)]
pub struct SqlitePersistence {
    conn: Connection,
}

impl SqlitePersistence {
    /// Wrap an already configured and migrated connection.
    pub const fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open (or create) the store file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(super::open_store(path)?))
    }

    /// A private in-memory store, mostly for tests.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(super::open_in_memory()?))
    }

    /// Borrow the underlying connection for ad hoc queries.
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Stored level for `name`, if the headword exists.
    pub fn stored_level(&self, name: &str) -> Result<Option<Level>> {
        let raw: Option<i64> = self
            .conn
            .query_row(
                "SELECT level FROM headwords WHERE headword_key = ?1",
                params![headword_key(name)],
                |row| row.get(0),
            )
            .optional()
            .context("query level")?;
        raw.map(Level::try_from)
            .transpose()
            .map_err(anyhow::Error::from)
    }
}

fn type_code(edge: &Edge) -> Result<i64> {
    edge.kind
        .type_code()
        .ok_or_else(|| anyhow!("edge {edge} is not canonical and cannot be stored"))
}

fn upsert_edge(conn: &Connection, edge: &Edge) -> Result<()> {
    let code = type_code(edge)?;
    conn.execute(
        "INSERT INTO edges (from_key, to_key, kind) VALUES (?1, ?2, ?3)
         ON CONFLICT(from_key, to_key) DO UPDATE SET kind = excluded.kind",
        params![headword_key(&edge.from), headword_key(&edge.to), code],
    )
    .with_context(|| format!("write edge {edge}"))?;
    Ok(())
}

fn delete_edge(conn: &Connection, from: &str, to: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM edges WHERE from_key = ?1 AND to_key = ?2",
        params![headword_key(from), headword_key(to)],
    )
    .with_context(|| format!("delete edge {from} -> {to}"))?;
    Ok(())
}

impl Persistence for SqlitePersistence {
    fn load_headwords(&mut self) -> Result<Vec<Headword>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, level FROM headwords ORDER BY headword_key")
            .context("prepare load_headwords")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .context("execute load_headwords")?;

        let mut headwords = Vec::new();
        for row in rows {
            let (name, raw_level) = row.context("read headword row")?;
            let level = Level::try_from(raw_level)
                .with_context(|| format!("headword {name:?} has a corrupt level"))?;
            headwords.push(
                Headword::new(&name, level)
                    .with_context(|| format!("headword {name:?} has a corrupt name"))?,
            );
        }
        Ok(headwords)
    }

    fn load_edges(&mut self) -> Result<Vec<Edge>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT from_name, to_name, kind FROM edge_names \
                 ORDER BY from_key, to_key",
            )
            .context("prepare load_edges")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })
            .context("execute load_edges")?;

        let mut edges = Vec::new();
        for row in rows {
            let (from, to, code) = row.context("read edge row")?;
            let Some(kind) = EdgeKind::from_type_code(code) else {
                bail!("edge {from} -> {to} has unknown type code {code}");
            };
            edges.push(Edge::new(from, to, kind));
        }
        Ok(edges)
    }

    fn persist_headword(&mut self, headword: &Headword) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO headwords (headword_key, name, level) VALUES (?1, ?2, ?3)
                 ON CONFLICT(headword_key) DO NOTHING",
                params![headword.key(), headword.name, headword.level.to_raw()],
            )
            .with_context(|| format!("write headword {:?}", headword.name))?;
        Ok(())
    }

    fn persist_edge(&mut self, edge: &Edge) -> Result<()> {
        upsert_edge(&self.conn, edge)
    }

    fn persist_level(&mut self, name: &str, level: Level) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE headwords SET level = ?2 WHERE headword_key = ?1",
                params![headword_key(name), level.to_raw()],
            )
            .with_context(|| format!("write level of {name:?}"))?;
        if changed == 0 {
            bail!("headword {name:?} is not in the store");
        }
        Ok(())
    }

    fn persist_edge_removal(&mut self, from: &str, to: &str) -> Result<()> {
        delete_edge(&self.conn, from, to)
    }

    fn persist_headword_removal(&mut self, name: &str) -> Result<()> {
        let key = headword_key(name);
        let tx = self.conn.transaction().context("begin headword removal")?;
        tx.execute(
            "DELETE FROM edges WHERE from_key = ?1 OR to_key = ?1",
            params![key],
        )
        .with_context(|| format!("delete edges of {name:?}"))?;
        tx.execute("DELETE FROM headwords WHERE headword_key = ?1", params![key])
            .with_context(|| format!("delete headword {name:?}"))?;
        tx.commit().context("commit headword removal")?;
        Ok(())
    }

    fn persist_commit(&mut self, commit: &EdgeCommit) -> Result<()> {
        let tx = self.conn.transaction().context("begin edge commit")?;
        if let Some(reverse) = &commit.removed_reverse {
            delete_edge(&tx, &reverse.from, &reverse.to)?;
        }
        upsert_edge(&tx, &commit.stored)?;
        tx.commit().context("commit edge")?;
        Ok(())
    }
}
