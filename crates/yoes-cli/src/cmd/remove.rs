//! `yoes remove`: delete a headword and every edge touching it.

use crate::cmd::Project;
use crate::output::{OutputMode, pretty_section, render_mode};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;
use yoes_core::Edge;

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Headword to delete.
    pub name: String,
}

#[derive(Debug, Serialize)]
struct RemoveReport {
    name: String,
    removed_edges: Vec<Edge>,
}

/// Execute `yoes remove <name>`.
///
/// # Errors
///
/// Returns an error if the headword is unknown or the store write fails.
pub fn run_remove(args: &RemoveArgs, output: OutputMode, cwd: &Path) -> Result<()> {
    let project = Project::discover(cwd)?;
    let (_lock, mut graph) = project.open_write()?;

    let name = graph
        .store()
        .headword(&args.name)
        .map_or_else(|| args.name.clone(), |headword| headword.name.clone());
    let removed_edges = graph.remove_headword(&args.name)?;

    let report = RemoveReport {
        name,
        removed_edges,
    };
    render_mode(
        output,
        &report,
        |r, w| {
            writeln!(
                w,
                "removed {} ({} edges)",
                r.name,
                r.removed_edges.len()
            )
        },
        |r, w| {
            pretty_section(w, &format!("Removed {}", r.name))?;
            for edge in &r.removed_edges {
                writeln!(w, "  {edge}")?;
            }
            Ok(())
        },
    )
}
