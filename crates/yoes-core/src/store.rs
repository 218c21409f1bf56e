//! In-memory owner of headwords and the typed edges between them.
//!
//! # Identity
//!
//! Headwords are identified by their key (see [`headword_key`]): the
//! whitespace-normalized, case-folded name. Every query accepts any spelling
//! that normalizes to the same key and answers with the display spelling
//! that was first inserted.
//!
//! # Edge storage
//!
//! Only canonical kinds (`Undefined`, `Depends`, `SubClass`) are stored, at
//! most one per ordered pair. Committing an inverse kind stores the forward
//! edge with swapped endpoints and drops whatever was stored for the
//! original direction, so one conceptual relation never ends up as two rows.
//!
//! # Failure semantics
//!
//! Mutations validate everything before they write. An `Err` always means
//! the store is unchanged.
//!
//! # Concurrency
//!
//! [`GraphStore`] itself is a plain value. [`SharedStore`] wraps it in an
//! `RwLock` so writers are serialized and readers never see a half-applied
//! commit.

#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::GraphError;
use crate::model::{Edge, EdgeKind, Headword, Level, headword_key, normalize_name};

// ---------------------------------------------------------------------------
// EdgeCommit
// ---------------------------------------------------------------------------

/// The effect of a [`GraphStore::commit_edge`] call, computed before it is
/// applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeCommit {
    /// The canonical edge that is (or will be) stored.
    pub stored: Edge,
    /// The kind previously stored for the same ordered pair, if any.
    pub replaced: Option<EdgeKind>,
    /// The opposite-direction edge dropped by an inverse-kind commit.
    pub removed_reverse: Option<Edge>,
}

// ---------------------------------------------------------------------------
// GraphStore
// ---------------------------------------------------------------------------

/// The headword graph: nodes keyed by normalized name, canonical edges keyed
/// by ordered key pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphStore {
    /// key → headword.
    headwords: BTreeMap<String, Headword>,
    /// (from key, to key) → stored kind.
    edges: BTreeMap<(String, String), EdgeKind>,
    /// (to key, from key) index for incoming lookups and cascades.
    incoming: BTreeSet<(String, String)>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -- headwords ----------------------------------------------------------

    /// Insert a headword if no headword with the same key exists.
    ///
    /// An existing headword is left untouched, level included. Returns
    /// `true` when a new headword was created.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidName`] if `name` is empty after normalization.
    pub fn upsert_headword(&mut self, name: &str, level: Level) -> Result<bool, GraphError> {
        let headword = Headword::new(name, level)?;
        let key = headword.key();
        if self.headwords.contains_key(&key) {
            return Ok(false);
        }
        debug!(headword = %headword.name, %level, "headword added");
        self.headwords.insert(key, headword);
        Ok(true)
    }

    /// Overwrite the level of an existing headword.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownHeadword`] if `name` is not present.
    pub fn set_level(&mut self, name: &str, level: Level) -> Result<(), GraphError> {
        let key = self.require(name)?;
        if let Some(headword) = self.headwords.get_mut(&key) {
            debug!(headword = %headword.name, from = %headword.level, to = %level, "level set");
            headword.level = level;
        }
        Ok(())
    }

    /// Delete a headword together with every edge that touches it.
    ///
    /// This is the only bulk edge deletion in the store and it cannot be
    /// undone. Returns the removed edges, outgoing first.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownHeadword`] if `name` is not present.
    pub fn remove_headword(&mut self, name: &str) -> Result<Vec<Edge>, GraphError> {
        let key = self.require(name)?;
        let mut removed = self.edges_from(name);
        removed.extend(self.edges_to(name));

        for edge in &removed {
            self.unlink_keys(&headword_key(&edge.from), &headword_key(&edge.to));
        }
        let headword = self.headwords.remove(&key);
        debug!(
            headword = headword.as_ref().map_or(name, |h| h.name.as_str()),
            edges = removed.len(),
            "headword removed"
        );
        Ok(removed)
    }

    /// Look up a headword by any spelling of its name.
    pub fn headword(&self, name: &str) -> Option<&Headword> {
        self.headwords.get(&headword_key(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.headword(name).is_some()
    }

    /// Every headword, alphabetical ignoring case.
    ///
    /// The order comes from the key index and does not depend on insertion
    /// order.
    pub fn all_headwords(&self) -> Vec<&Headword> {
        self.headwords.values().collect()
    }

    pub fn len(&self) -> usize {
        self.headwords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headwords.is_empty()
    }

    // -- edges --------------------------------------------------------------

    /// Store an edge, rewriting inverse kinds to their canonical form.
    ///
    /// Replaces whatever was stored for the resulting ordered pair. For
    /// `RDepends`/`SuperClass`, any edge stored for the original `(from, to)`
    /// direction is deleted in the same step.
    ///
    /// # Errors
    ///
    /// [`GraphError::UnknownHeadword`] if either endpoint is absent,
    /// [`GraphError::SelfReference`] if both endpoints are the same headword.
    pub fn commit_edge(
        &mut self,
        from: &str,
        to: &str,
        kind: EdgeKind,
    ) -> Result<EdgeCommit, GraphError> {
        let commit = self.prepare_edge(from, to, kind)?;
        self.apply_edge(&commit);
        Ok(commit)
    }

    /// Validate an edge commit and describe its effect without applying it.
    ///
    /// # Errors
    ///
    /// Same as [`GraphStore::commit_edge`].
    pub fn prepare_edge(
        &self,
        from: &str,
        to: &str,
        kind: EdgeKind,
    ) -> Result<EdgeCommit, GraphError> {
        let from_key = self.require(from)?;
        let to_key = self.require(to)?;
        if from_key == to_key {
            return Err(GraphError::SelfReference(self.display(&from_key)));
        }

        let (canonical, swapped) = kind.canonicalize();
        let (stored_from, stored_to) = if swapped {
            (to_key.clone(), from_key.clone())
        } else {
            (from_key.clone(), to_key.clone())
        };

        let replaced = self
            .edges
            .get(&(stored_from.clone(), stored_to.clone()))
            .copied();
        let removed_reverse = if swapped {
            self.edges
                .get(&(from_key.clone(), to_key.clone()))
                .map(|k| self.edge_at(&from_key, &to_key, *k))
        } else {
            None
        };

        Ok(EdgeCommit {
            stored: self.edge_at(&stored_from, &stored_to, canonical),
            replaced,
            removed_reverse,
        })
    }

    /// Apply a commit produced by [`GraphStore::prepare_edge`] on this store.
    pub(crate) fn apply_edge(&mut self, commit: &EdgeCommit) {
        if let Some(reverse) = &commit.removed_reverse {
            self.unlink_keys(&headword_key(&reverse.from), &headword_key(&reverse.to));
        }
        let from_key = headword_key(&commit.stored.from);
        let to_key = headword_key(&commit.stored.to);
        self.incoming.insert((to_key.clone(), from_key.clone()));
        self.edges.insert((from_key, to_key), commit.stored.kind);
        debug!(
            edge = %commit.stored,
            replaced = ?commit.replaced,
            dropped_reverse = commit.removed_reverse.is_some(),
            "edge committed"
        );
    }

    /// Delete the edge stored for exactly `(from, to)`.
    ///
    /// Absent edges (and unknown names) are not an error. Returns the
    /// removed edge, if any.
    pub fn remove_edge(&mut self, from: &str, to: &str) -> Option<Edge> {
        let from_key = headword_key(from);
        let to_key = headword_key(to);
        let kind = self.edges.get(&(from_key.clone(), to_key.clone())).copied()?;
        let edge = self.edge_at(&from_key, &to_key, kind);
        self.unlink_keys(&from_key, &to_key);
        debug!(%edge, "edge removed");
        Some(edge)
    }

    /// The stored kind for the ordered pair, if any.
    pub fn edge_kind(&self, from: &str, to: &str) -> Option<EdgeKind> {
        self.edges
            .get(&(headword_key(from), headword_key(to)))
            .copied()
    }

    /// Outgoing edges of `name`, ordered by target.
    pub fn edges_from(&self, name: &str) -> Vec<Edge> {
        let key = headword_key(name);
        self.edges
            .range((key.clone(), String::new())..)
            .take_while(|((from, _), _)| *from == key)
            .map(|((from, to), kind)| self.edge_at(from, to, *kind))
            .collect()
    }

    /// Incoming edges of `name`, ordered by source.
    pub fn edges_to(&self, name: &str) -> Vec<Edge> {
        let key = headword_key(name);
        self.incoming
            .range((key.clone(), String::new())..)
            .take_while(|(to, _)| *to == key)
            .filter_map(|(to, from)| {
                self.edges
                    .get(&(from.clone(), to.clone()))
                    .map(|kind| self.edge_at(from, to, *kind))
            })
            .collect()
    }

    /// Every stored edge, ordered by `(from, to)`.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges
            .iter()
            .map(|((from, to), kind)| self.edge_at(from, to, *kind))
    }

    /// Stored edges of one canonical kind, ordered by `(from, to)`.
    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = Edge> + '_ {
        self.edges
            .iter()
            .filter(move |(_, stored)| **stored == kind)
            .map(|((from, to), kind)| self.edge_at(from, to, *kind))
    }

    /// The edges the sequence validator consumes.
    pub fn depends_edges(&self) -> Vec<Edge> {
        self.edges_of_kind(EdgeKind::Depends).collect()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // -- helpers ------------------------------------------------------------

    fn require(&self, name: &str) -> Result<String, GraphError> {
        let key = headword_key(name);
        if self.headwords.contains_key(&key) {
            Ok(key)
        } else {
            Err(GraphError::UnknownHeadword(
                normalize_name(name).unwrap_or_else(|| name.to_string()),
            ))
        }
    }

    fn display(&self, key: &str) -> String {
        self.headwords
            .get(key)
            .map_or_else(|| key.to_string(), |h| h.name.clone())
    }

    fn edge_at(&self, from_key: &str, to_key: &str, kind: EdgeKind) -> Edge {
        Edge::new(self.display(from_key), self.display(to_key), kind)
    }

    fn unlink_keys(&mut self, from_key: &str, to_key: &str) {
        self.edges
            .remove(&(from_key.to_string(), to_key.to_string()));
        self.incoming
            .remove(&(to_key.to_string(), from_key.to_string()));
    }
}

// ---------------------------------------------------------------------------
// SharedStore
// ---------------------------------------------------------------------------

/// A cloneable handle that serializes writers over one [`GraphStore`].
///
/// `write` holds the exclusive lock for the whole closure, so an inverse
/// commit (read the reverse edge, drop it, insert the forward edge) is atomic
/// with respect to other writers. Readers share the lock and see either the
/// state before or after a write.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<GraphStore>>,
}

impl SharedStore {
    pub fn new(store: GraphStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Run `f` with shared read access.
    pub fn read<R>(&self, f: impl FnOnce(&GraphStore) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Run `f` with exclusive write access.
    pub fn write<R>(&self, f: impl FnOnce(&mut GraphStore) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// An owned copy of the current state.
    pub fn snapshot(&self) -> GraphStore {
        self.read(GraphStore::clone)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn store_with(names: &[&str]) -> GraphStore {
        let mut store = GraphStore::new();
        for name in names {
            store.upsert_headword(name, Level::Unknown).expect("upsert");
        }
        store
    }

    // -----------------------------------------------------------------------
    // Headwords
    // -----------------------------------------------------------------------

    #[test]
    fn upsert_creates_once() {
        let mut store = GraphStore::new();
        assert_eq!(store.upsert_headword("Atom", Level::ROOT), Ok(true));
        assert_eq!(store.upsert_headword(" atom ", Level::Depth(3)), Ok(false));
        assert_eq!(store.len(), 1);

        let atom = store.headword("ATOM").expect("present");
        assert_eq!(atom.name, "Atom");
        assert_eq!(atom.level, Level::ROOT, "upsert must not change level");
    }

    #[test]
    fn upsert_rejects_blank_name() {
        let mut store = GraphStore::new();
        assert!(matches!(
            store.upsert_headword(" \t", Level::Unknown),
            Err(GraphError::InvalidName(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn set_level_overwrites() {
        let mut store = store_with(&["Atom"]);
        store.set_level("atom", Level::Depth(2)).expect("set level");
        assert_eq!(store.headword("Atom").map(|h| h.level), Some(Level::Depth(2)));
    }

    #[test]
    fn set_level_unknown_headword() {
        let mut store = GraphStore::new();
        assert_eq!(
            store.set_level("Ghost", Level::ROOT),
            Err(GraphError::UnknownHeadword("Ghost".into()))
        );
    }

    #[test]
    fn all_headwords_alphabetical_ignoring_case() {
        let store = store_with(&["molecule", "Cell", "atom", "Bacteria"]);
        let names: Vec<&str> = store
            .all_headwords()
            .into_iter()
            .map(|h| h.name.as_str())
            .collect();
        assert_eq!(names, vec!["atom", "Bacteria", "Cell", "molecule"]);
    }

    // -----------------------------------------------------------------------
    // Edges
    // -----------------------------------------------------------------------

    #[test]
    fn commit_requires_both_endpoints() {
        let mut store = store_with(&["Atom"]);
        assert_eq!(
            store.commit_edge("Atom", "Quark", EdgeKind::Depends),
            Err(GraphError::UnknownHeadword("Quark".into()))
        );
        assert_eq!(
            store.commit_edge("Quark", "Atom", EdgeKind::Depends),
            Err(GraphError::UnknownHeadword("Quark".into()))
        );
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn commit_rejects_self_reference_by_key() {
        let mut store = store_with(&["Atom"]);
        assert_eq!(
            store.commit_edge("Atom", " ATOM", EdgeKind::SubClass),
            Err(GraphError::SelfReference("Atom".into()))
        );
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn commit_replaces_kind_for_same_pair() {
        let mut store = store_with(&["Atom", "Cell"]);
        store
            .commit_edge("Atom", "Cell", EdgeKind::Undefined)
            .expect("first");
        let commit = store
            .commit_edge("Atom", "Cell", EdgeKind::Depends)
            .expect("second");

        assert_eq!(commit.replaced, Some(EdgeKind::Undefined));
        assert_eq!(store.edge_count(), 1);
        assert_eq!(store.edge_kind("Atom", "Cell"), Some(EdgeKind::Depends));
    }

    #[test]
    fn rdepends_is_stored_as_swapped_depends() {
        let mut store = store_with(&["A", "B"]);
        let commit = store
            .commit_edge("A", "B", EdgeKind::RDepends)
            .expect("commit");

        assert_eq!(commit.stored, Edge::new("B", "A", EdgeKind::Depends));
        assert_eq!(store.edge_kind("B", "A"), Some(EdgeKind::Depends));
        assert_eq!(store.edge_kind("A", "B"), None);
    }

    #[test]
    fn inverse_commit_drops_stale_forward_edge() {
        let mut store = store_with(&["Cell", "Organism"]);
        store
            .commit_edge("Cell", "Organism", EdgeKind::SubClass)
            .expect("forward");
        let commit = store
            .commit_edge("Cell", "Organism", EdgeKind::SuperClass)
            .expect("inverse");

        assert_eq!(
            commit.removed_reverse,
            Some(Edge::new("Cell", "Organism", EdgeKind::SubClass))
        );
        assert_eq!(store.edge_count(), 1);
        assert_eq!(
            store.edge_kind("Organism", "Cell"),
            Some(EdgeKind::SubClass)
        );
        assert_eq!(store.edge_kind("Cell", "Organism"), None);
    }

    #[test]
    fn forward_commit_keeps_opposite_direction() {
        let mut store = store_with(&["A", "B"]);
        store.commit_edge("A", "B", EdgeKind::Depends).expect("ab");
        store.commit_edge("B", "A", EdgeKind::Undefined).expect("ba");
        assert_eq!(store.edge_count(), 2);
    }

    #[test]
    fn prepare_does_not_mutate() {
        let store = store_with(&["A", "B"]);
        let before = store.clone();
        let commit = store
            .prepare_edge("A", "B", EdgeKind::SuperClass)
            .expect("prepare");
        assert_eq!(commit.stored, Edge::new("B", "A", EdgeKind::SubClass));
        assert_eq!(store, before);
    }

    #[test]
    fn remove_edge_is_exact_and_idempotent() {
        let mut store = store_with(&["A", "B"]);
        store.commit_edge("A", "B", EdgeKind::Depends).expect("ab");
        store.commit_edge("B", "A", EdgeKind::SubClass).expect("ba");

        assert_eq!(
            store.remove_edge("a", "b"),
            Some(Edge::new("A", "B", EdgeKind::Depends))
        );
        assert_eq!(store.remove_edge("A", "B"), None);
        assert_eq!(store.remove_edge("Nobody", "B"), None);
        assert_eq!(store.edge_kind("B", "A"), Some(EdgeKind::SubClass));
        assert_eq!(store.edges_to("A").len(), 1);
        assert!(store.edges_to("B").is_empty());
    }

    #[test]
    fn queries_on_unknown_names_are_empty() {
        let store = store_with(&["A"]);
        assert!(store.edges_from("Ghost").is_empty());
        assert!(store.edges_to("Ghost").is_empty());
        assert_eq!(store.edge_kind("Ghost", "A"), None);
    }

    #[test]
    fn edges_from_and_to_are_ordered() {
        let mut store = store_with(&["Hub", "zeta", "Alpha", "mid"]);
        for other in ["zeta", "Alpha", "mid"] {
            store.commit_edge("Hub", other, EdgeKind::Depends).expect("out");
            store.commit_edge(other, "Hub", EdgeKind::Undefined).expect("in");
        }

        let targets: Vec<String> = store.edges_from("hub").into_iter().map(|e| e.to).collect();
        assert_eq!(targets, vec!["Alpha", "mid", "zeta"]);

        let sources: Vec<String> = store.edges_to("HUB").into_iter().map(|e| e.from).collect();
        assert_eq!(sources, vec!["Alpha", "mid", "zeta"]);
    }

    #[test]
    fn remove_headword_cascades() {
        let mut store = store_with(&["X", "Y", "Z"]);
        store.commit_edge("X", "Y", EdgeKind::Depends).expect("xy");
        store.commit_edge("Z", "X", EdgeKind::SubClass).expect("zx");
        store.commit_edge("Y", "Z", EdgeKind::Depends).expect("yz");

        let removed = store.remove_headword("x").expect("remove");
        assert_eq!(removed.len(), 2);
        assert!(!store.contains("X"));
        assert!(store.edges_from("X").is_empty());
        assert!(store.edges_to("X").is_empty());
        assert_eq!(store.edge_count(), 1);
        assert_eq!(store.edge_kind("Y", "Z"), Some(EdgeKind::Depends));
    }

    #[test]
    fn remove_unknown_headword_fails() {
        let mut store = GraphStore::new();
        assert_eq!(
            store.remove_headword("Ghost"),
            Err(GraphError::UnknownHeadword("Ghost".into()))
        );
    }

    #[test]
    fn edges_of_kind_filters() {
        let mut store = store_with(&["A", "B", "C"]);
        store.commit_edge("A", "B", EdgeKind::Depends).expect("ab");
        store.commit_edge("B", "C", EdgeKind::SubClass).expect("bc");
        store.commit_edge("C", "A", EdgeKind::Depends).expect("ca");

        assert_eq!(
            store.depends_edges(),
            vec![
                Edge::new("A", "B", EdgeKind::Depends),
                Edge::new("C", "A", EdgeKind::Depends),
            ]
        );
        assert_eq!(store.edges_of_kind(EdgeKind::SubClass).count(), 1);
        assert_eq!(store.edges().count(), 3);
    }

    // -----------------------------------------------------------------------
    // SharedStore
    // -----------------------------------------------------------------------

    #[test]
    fn shared_store_serializes_concurrent_inverse_commits() {
        let shared = SharedStore::new(store_with(&["A", "B"]));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let (from, to) = if i % 2 == 0 { ("A", "B") } else { ("B", "A") };
                    shared.write(|store| {
                        store
                            .commit_edge(from, to, EdgeKind::RDepends)
                            .map(|_| ())
                    })
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("join").expect("commit");
        }

        let snapshot = shared.snapshot();
        assert_eq!(snapshot.edge_count(), 1, "one relation, one stored edge");
    }

    #[test]
    fn shared_store_snapshot_is_independent() {
        let shared = SharedStore::new(store_with(&["A", "B"]));
        let before = shared.snapshot();
        shared
            .write(|store| store.commit_edge("A", "B", EdgeKind::Depends))
            .expect("commit");

        assert_eq!(before.edge_count(), 0);
        assert_eq!(shared.read(GraphStore::edge_count), 1);
    }
}
