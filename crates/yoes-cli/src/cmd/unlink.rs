//! `yoes unlink`: remove the edge stored from one headword to another.

use crate::cmd::Project;
use crate::output::{OutputMode, render_mode};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use yoes_core::Edge;

#[derive(Args, Debug)]
pub struct UnlinkArgs {
    /// Source headword of the stored edge.
    pub from: String,

    /// Target headword of the stored edge.
    pub to: String,
}

#[derive(Debug, Serialize)]
struct UnlinkReport {
    removed: Option<Edge>,
}

/// Execute `yoes unlink <from> <to>`. A missing edge is not an error.
///
/// # Errors
///
/// Returns an error if the store write fails.
pub fn run_unlink(args: &UnlinkArgs, output: OutputMode, cwd: &Path) -> Result<()> {
    let project = Project::discover(cwd)?;
    let (_lock, mut graph) = project.open_write()?;

    let report = UnlinkReport {
        removed: graph.remove_edge(&args.from, &args.to)?,
    };
    let line = |r: &UnlinkReport, w: &mut dyn Write| match &r.removed {
        Some(edge) => writeln!(w, "unlinked {edge}"),
        None => writeln!(w, "no edge from '{}' to '{}'", args.from, args.to),
    };
    render_mode(output, &report, line, line)
}
