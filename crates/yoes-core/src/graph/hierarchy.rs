//! Hierarchy forest built from `SubClass` edges.
//!
//! # Shape
//!
//! - A headword is a **root** iff its level is `0`.
//! - The children of a node are every headword `c` with a stored
//!   `SubClass(c, node)` edge ("c is a subclass of node").
//! - Roots and children are ordered alphabetically (ignoring case), so the
//!   forest does not depend on insertion order and building twice from the
//!   same store gives an equal value.
//! - A headword with several `SubClass` parents is expanded once, under the
//!   first parent the walk reaches. Every later parent lists it as a bare
//!   leaf, and a root already expanded below another root is a bare leaf
//!   at the top level.
//!
//! # Findings
//!
//! Structural anomalies are returned as data, never as errors:
//!
//! - [`HierarchyFinding::CycleDetected`]: a child that is already an
//!   ancestor on the current path. The closing edge `(child, node)` is
//!   reported once and not descended into; its siblings are still visited.
//! - [`HierarchyFinding::Unattached`]: a headword no root reaches. Cycles
//!   made only of unattached headwords are reported too.
//!
//! # Complexity
//!
//! Each headword is expanded at most once and each `SubClass` edge yields at
//! most one tree node, so both the walk and the forest are O(V+E).

#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::missing_const_for_fn,
)]

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::model::{EdgeKind, headword_key};
use crate::store::GraphStore;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One headword in the forest with its subclasses beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub name: String,
    /// Alphabetical by name, ignoring case.
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Pre-order walk: the node, then each child subtree left to right.
    pub fn preorder(&self) -> Vec<&Self> {
        let mut out = Vec::new();
        self.collect_preorder(&mut out);
        out
    }

    fn collect_preorder<'a>(&'a self, out: &mut Vec<&'a Self>) {
        out.push(self);
        for child in &self.children {
            child.collect_preorder(out);
        }
    }

    /// Number of levels in this subtree (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Self::depth).max().unwrap_or(0)
    }
}

/// A structural fact about the hierarchy that the host decides how to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "finding", rename_all = "snake_case")]
pub enum HierarchyFinding {
    /// `SubClass(from, to)` closes a loop: `from` is already an ancestor of
    /// `to` on the path being walked.
    CycleDetected { from: String, to: String },
    /// No level-0 headword reaches this headword.
    Unattached { name: String },
}

/// The forest of hierarchy trees plus everything that did not fit in it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HierarchyForest {
    /// One tree per level-0 headword, alphabetical.
    pub roots: Vec<TreeNode>,
    /// Cycles in discovery order, then unattached headwords alphabetically.
    pub findings: Vec<HierarchyFinding>,
}

impl HierarchyForest {
    /// Enumerate the forest left to right, top to bottom.
    ///
    /// Each headword is listed at its first occurrence only, so the result
    /// is a valid order for the sequence validator.
    pub fn flatten(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.roots
            .iter()
            .flat_map(TreeNode::preorder)
            .filter(|node| seen.insert(headword_key(&node.name)))
            .map(|node| node.name.clone())
            .collect()
    }

    /// Closing edges of every detected cycle, as `(from, to)`.
    pub fn cycles(&self) -> impl Iterator<Item = (&str, &str)> {
        self.findings.iter().filter_map(|finding| match finding {
            HierarchyFinding::CycleDetected { from, to } => Some((from.as_str(), to.as_str())),
            HierarchyFinding::Unattached { .. } => None,
        })
    }

    /// Headwords no root reaches, alphabetical.
    pub fn unattached(&self) -> impl Iterator<Item = &str> {
        self.findings.iter().filter_map(|finding| match finding {
            HierarchyFinding::Unattached { name } => Some(name.as_str()),
            HierarchyFinding::CycleDetected { .. } => None,
        })
    }

    /// First node named `name` in pre-order, matching by key. This is the
    /// node that carries the headword's subtree.
    pub fn find(&self, name: &str) -> Option<&TreeNode> {
        let key = headword_key(name);
        self.roots
            .iter()
            .flat_map(TreeNode::preorder)
            .find(|node| headword_key(&node.name) == key)
    }

    /// Total tree nodes, including bare leaves for headwords expanded
    /// elsewhere. Never more than headwords plus `SubClass` edges.
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(|root| root.preorder().len()).sum()
    }

    /// Deepest tree in the forest; `0` when there are no roots.
    pub fn depth(&self) -> usize {
        self.roots.iter().map(TreeNode::depth).max().unwrap_or(0)
    }

    pub fn has_cycles(&self) -> bool {
        self.cycles().next().is_some()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Build the hierarchy forest from a read-only view of the store.
///
/// The result owns its data and holds no reference back into `store`.
pub fn build_hierarchy(store: &GraphStore) -> HierarchyForest {
    let mut walk = Walk::new(store);

    let roots: Vec<String> = store
        .all_headwords()
        .into_iter()
        .filter(|headword| headword.level.is_root())
        .map(|headword| headword.key())
        .collect();

    let trees: Vec<TreeNode> = roots
        .iter()
        .map(|root| {
            if walk.attached.contains(root) {
                TreeNode::leaf(walk.names[root].clone())
            } else {
                walk.descend(root)
            }
        })
        .collect();

    let unattached: Vec<String> = walk
        .names
        .keys()
        .filter(|key| !walk.attached.contains(*key))
        .cloned()
        .collect();
    walk.scan_detached_cycles(&unattached);

    let mut findings = walk.cycles;
    findings.extend(unattached.iter().map(|key| HierarchyFinding::Unattached {
        name: walk.names[key].clone(),
    }));

    debug!(
        roots = trees.len(),
        unattached = unattached.len(),
        findings = findings.len(),
        "hierarchy built"
    );

    HierarchyForest {
        roots: trees,
        findings,
    }
}

/// DFS colors for the detached cycle scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Currently on the DFS stack.
    Gray,
    /// Fully processed.
    Black,
}

struct Walk {
    /// key → display name.
    names: BTreeMap<String, String>,
    /// parent key → child keys (alphabetical).
    children: HashMap<String, BTreeSet<String>>,
    /// Keys on the current root-to-node path.
    path: HashSet<String>,
    /// Keys reached from some root. Each is expanded exactly once.
    attached: HashSet<String>,
    /// Closing edges already reported, as (from key, to key).
    reported: HashSet<(String, String)>,
    cycles: Vec<HierarchyFinding>,
}

impl Walk {
    fn new(store: &GraphStore) -> Self {
        let names = store
            .all_headwords()
            .into_iter()
            .map(|headword| (headword.key(), headword.name.clone()))
            .collect();

        let mut children: HashMap<String, BTreeSet<String>> = HashMap::new();
        for edge in store.edges_of_kind(EdgeKind::SubClass) {
            children
                .entry(headword_key(&edge.to))
                .or_default()
                .insert(headword_key(&edge.from));
        }

        Self {
            names,
            children,
            path: HashSet::new(),
            attached: HashSet::new(),
            reported: HashSet::new(),
            cycles: Vec::new(),
        }
    }

    fn children_of(&self, key: &str) -> Vec<String> {
        self.children
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn descend(&mut self, key: &str) -> TreeNode {
        self.path.insert(key.to_string());
        self.attached.insert(key.to_string());

        let mut node = TreeNode::leaf(self.names[key].clone());
        for child in self.children_of(key) {
            if self.path.contains(&child) {
                self.report_cycle(&child, key);
            } else if self.attached.contains(&child) {
                node.children.push(TreeNode::leaf(self.names[&child].clone()));
            } else {
                node.children.push(self.descend(&child));
            }
        }

        self.path.remove(key);
        node
    }

    /// Three-color DFS over headwords no root reached.
    ///
    /// An unattached headword may still have attached children. Those were
    /// walked by `descend` already, so the scan stays inside the unattached
    /// set and every cycle is reported by exactly one of the two walks.
    fn scan_detached_cycles(&mut self, unattached: &[String]) {
        let mut color: HashMap<String, Color> = HashMap::new();
        for key in unattached {
            if !color.contains_key(key) {
                self.color_dfs(key, &mut color);
            }
        }
    }

    fn color_dfs(&mut self, key: &str, color: &mut HashMap<String, Color>) {
        color.insert(key.to_string(), Color::Gray);
        for child in self.children_of(key) {
            if self.attached.contains(&child) {
                continue;
            }
            match color.get(&child) {
                Some(Color::Gray) => self.report_cycle(&child, key),
                Some(Color::Black) => {}
                None => self.color_dfs(&child, color),
            }
        }
        color.insert(key.to_string(), Color::Black);
    }

    fn report_cycle(&mut self, from: &str, to: &str) {
        if self.reported.insert((from.to_string(), to.to_string())) {
            debug!(from = %self.names[from], to = %self.names[to], "subclass cycle");
            self.cycles.push(HierarchyFinding::CycleDetected {
                from: self.names[from].clone(),
                to: self.names[to].clone(),
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Level;

    fn add(store: &mut GraphStore, name: &str, level: Level) {
        store.upsert_headword(name, level).expect("upsert");
    }

    fn sub(store: &mut GraphStore, child: &str, parent: &str) {
        store
            .commit_edge(child, parent, EdgeKind::SubClass)
            .expect("subclass");
    }

    fn node(name: &str, children: Vec<TreeNode>) -> TreeNode {
        TreeNode {
            name: name.to_string(),
            children,
        }
    }

    #[test]
    fn empty_store_builds_empty_forest() {
        let forest = build_hierarchy(&GraphStore::new());
        assert!(forest.roots.is_empty());
        assert!(forest.findings.is_empty());
        assert_eq!(forest.depth(), 0);
    }

    #[test]
    fn children_are_alphabetical_regardless_of_insertion() {
        let mut store = GraphStore::new();
        add(&mut store, "Life", Level::ROOT);
        for name in ["zoology", "Botany", "ecology"] {
            add(&mut store, name, Level::Depth(1));
            sub(&mut store, name, "Life");
        }

        let forest = build_hierarchy(&store);
        assert_eq!(
            forest.roots,
            vec![node(
                "Life",
                vec![
                    TreeNode::leaf("Botany"),
                    TreeNode::leaf("ecology"),
                    TreeNode::leaf("zoology"),
                ]
            )]
        );
        assert!(forest.findings.is_empty());
    }

    #[test]
    fn roots_are_level_zero_only() {
        let mut store = GraphStore::new();
        add(&mut store, "Physics", Level::ROOT);
        add(&mut store, "Chemistry", Level::ROOT);
        add(&mut store, "Optics", Level::Depth(1));
        add(&mut store, "Stray", Level::Unknown);
        sub(&mut store, "Optics", "Physics");

        let forest = build_hierarchy(&store);
        let names: Vec<&str> = forest.roots.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Chemistry", "Physics"]);
        assert_eq!(forest.unattached().collect::<Vec<_>>(), vec!["Stray"]);
    }

    #[test]
    fn non_subclass_edges_do_not_shape_the_tree() {
        let mut store = GraphStore::new();
        add(&mut store, "Physics", Level::ROOT);
        add(&mut store, "Optics", Level::Depth(1));
        store
            .commit_edge("Optics", "Physics", EdgeKind::Depends)
            .expect("depends");

        let forest = build_hierarchy(&store);
        assert!(forest.roots[0].children.is_empty());
        assert_eq!(forest.unattached().collect::<Vec<_>>(), vec!["Optics"]);
    }

    #[test]
    fn superclass_commit_attaches_child() {
        let mut store = GraphStore::new();
        add(&mut store, "Physics", Level::ROOT);
        add(&mut store, "Optics", Level::Depth(1));
        store
            .commit_edge("Physics", "Optics", EdgeKind::SuperClass)
            .expect("superclass");

        let forest = build_hierarchy(&store);
        assert_eq!(
            forest.roots,
            vec![node("Physics", vec![TreeNode::leaf("Optics")])]
        );
    }

    #[test]
    fn shared_child_is_expanded_under_first_parent_only() {
        let mut store = GraphStore::new();
        add(&mut store, "Root", Level::ROOT);
        add(&mut store, "Left", Level::Depth(1));
        add(&mut store, "Right", Level::Depth(1));
        add(&mut store, "Shared", Level::Depth(2));
        add(&mut store, "Deep", Level::Depth(3));
        sub(&mut store, "Left", "Root");
        sub(&mut store, "Right", "Root");
        sub(&mut store, "Shared", "Left");
        sub(&mut store, "Shared", "Right");
        sub(&mut store, "Deep", "Shared");

        let forest = build_hierarchy(&store);
        assert_eq!(
            forest.roots,
            vec![node(
                "Root",
                vec![
                    node("Left", vec![node("Shared", vec![TreeNode::leaf("Deep")])]),
                    node("Right", vec![TreeNode::leaf("Shared")]),
                ]
            )]
        );
        assert_eq!(forest.node_count(), 6);
        assert_eq!(
            forest.flatten(),
            vec!["Root", "Left", "Shared", "Deep", "Right"]
        );
        assert_eq!(forest.find("shared").map(|n| n.children.len()), Some(1));
        assert!(forest.findings.is_empty());
    }

    #[test]
    fn stacked_diamonds_stay_linear() {
        let mut store = GraphStore::new();
        add(&mut store, "Root", Level::ROOT);
        let mut above = vec!["Root".to_string()];
        for layer in 1..=18 {
            let names: Vec<String> = ["a", "b"]
                .iter()
                .map(|side| format!("N{layer:02}{side}"))
                .collect();
            for name in &names {
                add(&mut store, name, Level::Unknown);
                for parent in &above {
                    sub(&mut store, name, parent);
                }
            }
            above = names;
        }
        assert_eq!(store.len(), 37);
        assert_eq!(store.edge_count(), 70);

        let forest = build_hierarchy(&store);
        assert!(forest.node_count() <= store.len() + store.edge_count());
        assert_eq!(forest.flatten().len(), 37);
        assert_eq!(forest.depth(), 19);
        assert!(forest.findings.is_empty());
    }

    #[test]
    fn root_below_another_root_is_a_top_level_leaf() {
        let mut store = GraphStore::new();
        add(&mut store, "Alpha", Level::ROOT);
        add(&mut store, "Beta", Level::ROOT);
        add(&mut store, "Gamma", Level::Depth(1));
        sub(&mut store, "Beta", "Alpha");
        sub(&mut store, "Gamma", "Beta");

        let forest = build_hierarchy(&store);
        assert_eq!(
            forest.roots,
            vec![
                node("Alpha", vec![node("Beta", vec![TreeNode::leaf("Gamma")])]),
                TreeNode::leaf("Beta"),
            ]
        );
        assert_eq!(forest.flatten(), vec!["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn cycle_below_root_reported_once() {
        let mut store = GraphStore::new();
        add(&mut store, "Root", Level::ROOT);
        for name in ["A", "B", "C"] {
            add(&mut store, name, Level::Depth(1));
        }
        sub(&mut store, "A", "Root");
        sub(&mut store, "B", "A");
        sub(&mut store, "C", "B");
        sub(&mut store, "A", "C");

        let forest = build_hierarchy(&store);
        assert_eq!(forest.cycles().collect::<Vec<_>>(), vec![("A", "C")]);
        assert_eq!(
            forest.roots,
            vec![node(
                "Root",
                vec![node("A", vec![node("B", vec![TreeNode::leaf("C")])])]
            )]
        );
        assert_eq!(forest.unattached().count(), 0);
    }

    #[test]
    fn cycle_reached_from_two_roots_reported_once() {
        let mut store = GraphStore::new();
        add(&mut store, "R1", Level::ROOT);
        add(&mut store, "R2", Level::ROOT);
        add(&mut store, "A", Level::Depth(1));
        add(&mut store, "B", Level::Depth(2));
        sub(&mut store, "A", "R1");
        sub(&mut store, "A", "R2");
        sub(&mut store, "B", "A");
        sub(&mut store, "A", "B");

        let forest = build_hierarchy(&store);
        assert_eq!(forest.cycles().count(), 1);
    }

    #[test]
    fn cycle_through_root_is_detected() {
        let mut store = GraphStore::new();
        add(&mut store, "Root", Level::ROOT);
        add(&mut store, "Leaf", Level::Depth(1));
        sub(&mut store, "Leaf", "Root");
        sub(&mut store, "Root", "Leaf");

        let forest = build_hierarchy(&store);
        assert_eq!(forest.cycles().collect::<Vec<_>>(), vec![("Root", "Leaf")]);
    }

    #[test]
    fn detached_cycle_is_reported_with_unattached_members() {
        let mut store = GraphStore::new();
        for name in ["A", "B", "C"] {
            add(&mut store, name, Level::Unknown);
        }
        sub(&mut store, "B", "A");
        sub(&mut store, "C", "B");
        sub(&mut store, "A", "C");

        let forest = build_hierarchy(&store);
        assert!(forest.roots.is_empty());
        assert_eq!(forest.cycles().collect::<Vec<_>>(), vec![("A", "C")]);
        assert_eq!(
            forest.unattached().collect::<Vec<_>>(),
            vec!["A", "B", "C"]
        );
    }

    #[test]
    fn cycle_with_unattached_parent_reported_once() {
        let mut store = GraphStore::new();
        add(&mut store, "Root", Level::ROOT);
        for name in ["U", "X", "Y"] {
            add(&mut store, name, Level::Unknown);
        }
        sub(&mut store, "X", "Root");
        sub(&mut store, "Y", "X");
        sub(&mut store, "X", "Y");
        sub(&mut store, "Y", "U");

        let forest = build_hierarchy(&store);
        assert_eq!(forest.cycles().collect::<Vec<_>>(), vec![("X", "Y")]);
        assert_eq!(forest.unattached().collect::<Vec<_>>(), vec!["U"]);
    }

    #[test]
    fn detached_walk_does_not_enter_attached_cycles() {
        let mut store = GraphStore::new();
        add(&mut store, "Root", Level::ROOT);
        for name in ["P", "Q", "S", "T"] {
            add(&mut store, name, Level::Unknown);
        }
        sub(&mut store, "P", "Root");
        sub(&mut store, "Q", "P");
        sub(&mut store, "P", "Q");
        // Detached loop S <-> T that also feeds both attached nodes.
        sub(&mut store, "T", "S");
        sub(&mut store, "S", "T");
        sub(&mut store, "P", "S");
        sub(&mut store, "Q", "T");

        let forest = build_hierarchy(&store);
        assert_eq!(
            forest.cycles().collect::<Vec<_>>(),
            vec![("P", "Q"), ("S", "T")]
        );
        assert_eq!(forest.unattached().collect::<Vec<_>>(), vec!["S", "T"]);
    }

    #[test]
    fn build_is_deterministic() {
        let mut store = GraphStore::new();
        add(&mut store, "Root", Level::ROOT);
        for name in ["d", "b", "c", "a"] {
            add(&mut store, name, Level::Depth(1));
            sub(&mut store, name, "Root");
        }
        sub(&mut store, "a", "b");

        assert_eq!(build_hierarchy(&store), build_hierarchy(&store));
    }

    #[test]
    fn find_and_depth() {
        let mut store = GraphStore::new();
        add(&mut store, "Root", Level::ROOT);
        add(&mut store, "Mid", Level::Depth(1));
        add(&mut store, "Low", Level::Depth(2));
        sub(&mut store, "Mid", "Root");
        sub(&mut store, "Low", "Mid");

        let forest = build_hierarchy(&store);
        assert_eq!(forest.depth(), 3);
        assert_eq!(
            forest.find("mid").map(|n| n.children.len()),
            Some(1)
        );
        assert!(forest.find("Nowhere").is_none());
    }

    #[test]
    fn findings_serialize_with_tag() {
        let finding = HierarchyFinding::Unattached {
            name: "Stray".into(),
        };
        let json = serde_json::to_value(&finding).expect("serialize");
        assert_eq!(json["finding"], "unattached");
        assert_eq!(json["name"], "Stray");
    }
}
