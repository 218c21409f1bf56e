//! `yoes tree`: the hierarchy forest.
//!
//! Pretty output draws the forest with box characters. Unattached headwords
//! are grouped under the configured bucket label; cycles are listed as
//! warnings after the trees.

use crate::cmd::{HostError, Project};
use crate::output::{OutputMode, render_mode};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use yoes_core::config::HierarchyConfig;
use yoes_core::{GraphError, GraphStore, HierarchyForest, TreeNode, build_hierarchy};

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Only show the subtree rooted at this headword.
    #[arg(long)]
    pub root: Option<String>,
}

#[derive(Debug, Serialize)]
struct TreeReport {
    #[serde(flatten)]
    forest: HierarchyForest,
    /// Pre-order enumeration, first occurrence only.
    order: Vec<String>,
    #[serde(skip)]
    bucket: Option<String>,
}

/// Execute `yoes tree`.
///
/// # Errors
///
/// Returns an error if `--root` names a headword that is missing or
/// unattached, or the store cannot be loaded.
pub fn run_tree(args: &TreeArgs, output: OutputMode, cwd: &Path) -> Result<()> {
    let project = Project::discover(cwd)?;
    let (_lock, graph) = project.open_read()?;
    let mut forest = build_hierarchy(graph.store());

    if let Some(root) = &args.root {
        forest = subtree_at(graph.store(), &forest, root)?;
    }

    let report = TreeReport {
        order: forest.flatten(),
        forest,
        bucket: bucket_label(&project.config.hierarchy),
    };
    render_mode(output, &report, render_text, render_pretty)
}

/// The forest cut down to the subtree under `root`.
fn subtree_at(
    store: &GraphStore,
    forest: &HierarchyForest,
    root: &str,
) -> Result<HierarchyForest> {
    let Some(headword) = store.headword(root) else {
        return Err(GraphError::UnknownHeadword(root.to_string()).into());
    };
    let subtree = forest
        .find(root)
        .cloned()
        .ok_or_else(|| HostError::NotInHierarchy(headword.name.clone()))?;
    Ok(HierarchyForest {
        roots: vec![subtree],
        findings: Vec::new(),
    })
}

fn bucket_label(config: &HierarchyConfig) -> Option<String> {
    config
        .show_unattached
        .then(|| config.unattached_bucket.clone())
}

/// One headword per line, indented two spaces per depth.
fn render_text(r: &TreeReport, w: &mut dyn Write) -> io::Result<()> {
    fn walk(node: &TreeNode, depth: usize, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{:indent$}{}", "", node.name, indent = depth * 2)?;
        node.children
            .iter()
            .try_for_each(|child| walk(child, depth + 1, w))
    }

    for root in &r.forest.roots {
        walk(root, 0, w)?;
    }
    if let Some(bucket) = &r.bucket {
        let unattached: Vec<_> = r.forest.unattached().collect();
        if !unattached.is_empty() {
            writeln!(w, "{bucket}")?;
            for name in unattached {
                writeln!(w, "  {name}")?;
            }
        }
    }
    for (from, to) in r.forest.cycles() {
        writeln!(w, "cycle\t{from}\t{to}")?;
    }
    Ok(())
}

fn render_pretty(r: &TreeReport, w: &mut dyn Write) -> io::Result<()> {
    fn walk(node: &TreeNode, prefix: &str, last: bool, w: &mut dyn Write) -> io::Result<()> {
        let branch = if last { "└── " } else { "├── " };
        writeln!(w, "{prefix}{branch}{}", node.name)?;
        let next = format!("{prefix}{}", if last { "    " } else { "│   " });
        let count = node.children.len();
        for (i, child) in node.children.iter().enumerate() {
            walk(child, &next, i + 1 == count, w)?;
        }
        Ok(())
    }

    fn draw(node: &TreeNode, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}", node.name)?;
        let count = node.children.len();
        for (i, child) in node.children.iter().enumerate() {
            walk(child, "", i + 1 == count, w)?;
        }
        Ok(())
    }

    for root in &r.forest.roots {
        draw(root, w)?;
    }

    if let Some(bucket) = &r.bucket {
        let unattached: Vec<_> = r.forest.unattached().map(TreeNode::leaf).collect();
        if !unattached.is_empty() {
            draw(
                &TreeNode {
                    name: bucket.clone(),
                    children: unattached,
                },
                w,
            )?;
        }
    }

    if r.forest.roots.is_empty() && r.forest.findings.is_empty() {
        writeln!(w, "(empty hierarchy)")?;
    }

    for (from, to) in r.forest.cycles() {
        writeln!(w, "warning: subclass cycle at {from} -> {to}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use yoes_core::{EdgeKind, Level};

    fn report(store: &GraphStore, bucket: Option<&str>) -> TreeReport {
        let forest = build_hierarchy(store);
        TreeReport {
            order: forest.flatten(),
            forest,
            bucket: bucket.map(str::to_string),
        }
    }

    fn mechanics() -> GraphStore {
        let mut store = GraphStore::new();
        store.upsert_headword("Force", Level::ROOT).unwrap();
        store.upsert_headword("Motion", Level::Unknown).unwrap();
        store.upsert_headword("Energy", Level::Unknown).unwrap();
        store.upsert_headword("Heat", Level::Unknown).unwrap();
        store.upsert_headword("Optics", Level::Unknown).unwrap();
        store
            .commit_edge("Motion", "Force", EdgeKind::SubClass)
            .unwrap();
        store
            .commit_edge("Energy", "Force", EdgeKind::SubClass)
            .unwrap();
        store.commit_edge("Heat", "Energy", EdgeKind::SubClass).unwrap();
        store
    }

    fn rendered(r: &TreeReport, f: fn(&TreeReport, &mut dyn Write) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(r, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn pretty_tree_draws_branches_and_bucket() {
        let out = rendered(&report(&mechanics(), Some("Undefined")), render_pretty);
        assert_eq!(
            out,
            "Force\n├── Energy\n│   └── Heat\n└── Motion\nUndefined\n└── Optics\n"
        );
    }

    #[test]
    fn text_tree_indents_by_depth() {
        let out = rendered(&report(&mechanics(), None), render_text);
        assert_eq!(out, "Force\n  Energy\n    Heat\n  Motion\n");
    }

    #[test]
    fn subtree_at_cuts_forest_to_one_root() {
        let store = mechanics();
        let forest = build_hierarchy(&store);
        let cut = subtree_at(&store, &forest, "energy").unwrap();
        assert_eq!(cut.flatten(), vec!["Energy", "Heat"]);
        assert!(cut.findings.is_empty());
    }

    #[test]
    fn subtree_at_separates_missing_from_unattached() {
        let store = mechanics();
        let forest = build_hierarchy(&store);

        let missing = subtree_at(&store, &forest, "Quark").unwrap_err();
        assert!(matches!(
            missing.downcast_ref::<GraphError>(),
            Some(GraphError::UnknownHeadword(name)) if name == "Quark"
        ));

        let stray = subtree_at(&store, &forest, "optics").unwrap_err();
        assert!(matches!(
            stray.downcast_ref::<HostError>(),
            Some(HostError::NotInHierarchy(name)) if name == "Optics"
        ));
        assert_eq!(
            stray.to_string(),
            "Optics is unattached: no level-0 headword reaches it"
        );
    }

    #[test]
    fn cycles_are_rendered_as_warnings() {
        let mut store = GraphStore::new();
        store.upsert_headword("A", Level::ROOT).unwrap();
        store.upsert_headword("B", Level::Unknown).unwrap();
        store.commit_edge("B", "A", EdgeKind::SubClass).unwrap();
        store.commit_edge("A", "B", EdgeKind::SubClass).unwrap();

        let out = rendered(&report(&store, None), render_pretty);
        assert!(out.contains("warning: subclass cycle"), "{out}");
    }
}
