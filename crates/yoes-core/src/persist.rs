//! Persistence collaborator and a store that writes through it.
//!
//! The engine has no storage format of its own. A host hands it a
//! [`Persistence`] implementation; [`PersistentGraph`] loads the graph from
//! it once and then mirrors every successful mutation into it.
//!
//! # Ordering
//!
//! Each mutation is validated against the in-memory store first, then
//! persisted, then applied in memory. If validation or the persistence call
//! fails, the in-memory store is untouched. Batching and transaction
//! boundaries beyond a single call are the implementation's business.

#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::error::GraphError;
use crate::model::{Edge, EdgeKind, Headword, Level};
use crate::store::{EdgeCommit, GraphStore};

/// Synchronous storage hooks satisfied by the host.
///
/// A call that returns `Ok` is durable. Names passed in are display names;
/// implementations that index by identity should use
/// [`headword_key`](crate::model::headword_key).
pub trait Persistence {
    fn load_headwords(&mut self) -> Result<Vec<Headword>>;

    /// Edges are always canonical (`Undefined`, `Depends`, `SubClass`).
    fn load_edges(&mut self) -> Result<Vec<Edge>>;

    fn persist_headword(&mut self, headword: &Headword) -> Result<()>;

    /// Store `edge`, replacing any edge for the same ordered pair.
    fn persist_edge(&mut self, edge: &Edge) -> Result<()>;

    fn persist_level(&mut self, name: &str, level: Level) -> Result<()>;

    fn persist_edge_removal(&mut self, from: &str, to: &str) -> Result<()>;

    /// Remove the headword and every edge that touches it.
    fn persist_headword_removal(&mut self, name: &str) -> Result<()>;

    /// Persist a whole edge commit: the dropped reverse edge, then the
    /// stored edge.
    ///
    /// The default makes two calls. Implementations with transactions
    /// should override it so the pair lands together or not at all.
    fn persist_commit(&mut self, commit: &EdgeCommit) -> Result<()> {
        if let Some(reverse) = &commit.removed_reverse {
            self.persist_edge_removal(&reverse.from, &reverse.to)
                .with_context(|| format!("persist removal of {reverse}"))?;
        }
        self.persist_edge(&commit.stored)
            .with_context(|| format!("persist edge {}", commit.stored))
    }
}

/// Persistence that keeps nothing; for hosts that only need the engine in
/// memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPersistence;

impl Persistence for NullPersistence {
    fn load_headwords(&mut self) -> Result<Vec<Headword>> {
        Ok(Vec::new())
    }

    fn load_edges(&mut self) -> Result<Vec<Edge>> {
        Ok(Vec::new())
    }

    fn persist_headword(&mut self, _headword: &Headword) -> Result<()> {
        Ok(())
    }

    fn persist_edge(&mut self, _edge: &Edge) -> Result<()> {
        Ok(())
    }

    fn persist_level(&mut self, _name: &str, _level: Level) -> Result<()> {
        Ok(())
    }

    fn persist_edge_removal(&mut self, _from: &str, _to: &str) -> Result<()> {
        Ok(())
    }

    fn persist_headword_removal(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }
}

/// A [`GraphStore`] whose mutations are written through a [`Persistence`].
#[derive(Debug)]
pub struct PersistentGraph<P> {
    store: GraphStore,
    persistence: P,
}

impl<P: Persistence> PersistentGraph<P> {
    /// Load every headword, then every edge, from `persistence`.
    ///
    /// # Errors
    ///
    /// Fails if loading fails or the loaded data breaks a store invariant
    /// (an edge naming a missing headword, a self-loop, a blank name).
    pub fn open(mut persistence: P) -> Result<Self> {
        let mut store = GraphStore::new();

        let headwords = persistence.load_headwords().context("load headwords")?;
        for headword in &headwords {
            store
                .upsert_headword(&headword.name, headword.level)
                .with_context(|| format!("load headword {:?}", headword.name))?;
        }

        let edges = persistence.load_edges().context("load edges")?;
        for edge in &edges {
            store
                .commit_edge(&edge.from, &edge.to, edge.kind)
                .with_context(|| format!("load edge {edge}"))?;
        }

        info!(
            headwords = store.len(),
            edges = store.edge_count(),
            "graph loaded"
        );
        Ok(Self { store, persistence })
    }

    /// Read-only view of the loaded graph.
    pub const fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Give back the persistence handle.
    pub fn into_parts(self) -> (GraphStore, P) {
        (self.store, self.persistence)
    }

    /// See [`GraphStore::upsert_headword`]. Existing headwords are not
    /// re-persisted.
    pub fn upsert_headword(&mut self, name: &str, level: Level) -> Result<bool> {
        let headword = Headword::new(name, level)?;
        if self.store.contains(&headword.name) {
            return Ok(false);
        }
        self.persistence
            .persist_headword(&headword)
            .with_context(|| format!("persist headword {:?}", headword.name))?;
        Ok(self.store.upsert_headword(&headword.name, level)?)
    }

    /// See [`GraphStore::set_level`].
    pub fn set_level(&mut self, name: &str, level: Level) -> Result<()> {
        let display = self
            .store
            .headword(name)
            .map(|headword| headword.name.clone())
            .ok_or_else(|| GraphError::UnknownHeadword(name.to_string()))?;
        self.persistence
            .persist_level(&display, level)
            .with_context(|| format!("persist level of {display:?}"))?;
        Ok(self.store.set_level(&display, level)?)
    }

    /// See [`GraphStore::commit_edge`]. The reverse-edge removal and the
    /// insert are persisted before either is applied in memory.
    pub fn commit_edge(&mut self, from: &str, to: &str, kind: EdgeKind) -> Result<EdgeCommit> {
        let commit = self.store.prepare_edge(from, to, kind)?;
        self.persistence.persist_commit(&commit)?;
        self.store.apply_edge(&commit);
        Ok(commit)
    }

    /// See [`GraphStore::remove_edge`].
    pub fn remove_edge(&mut self, from: &str, to: &str) -> Result<Option<Edge>> {
        if self.store.edge_kind(from, to).is_none() {
            debug!(from, to, "no edge to remove");
            return Ok(None);
        }
        self.persistence
            .persist_edge_removal(from, to)
            .with_context(|| format!("persist removal of {from} -> {to}"))?;
        Ok(self.store.remove_edge(from, to))
    }

    /// See [`GraphStore::remove_headword`]. Destructive: every incident edge
    /// goes with it.
    pub fn remove_headword(&mut self, name: &str) -> Result<Vec<Edge>> {
        if !self.store.contains(name) {
            return Err(GraphError::UnknownHeadword(name.to_string()).into());
        }
        self.persistence
            .persist_headword_removal(name)
            .with_context(|| format!("persist removal of headword {name:?}"))?;
        Ok(self.store.remove_headword(name)?)
    }
}
