//! `yoes add`: register a headword.

use crate::cmd::Project;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;
use yoes_core::Level;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Headword name. Surrounding and repeated whitespace is collapsed.
    pub name: String,

    /// Initial level: `unknown`, `-1`, or a depth (`0` makes a root).
    #[arg(long, default_value = "unknown", allow_hyphen_values = true)]
    pub level: String,
}

#[derive(Debug, Serialize)]
struct AddReport {
    name: String,
    level: Level,
    created: bool,
}

/// Execute `yoes add <name>`. Adding an existing headword is a no-op and
/// leaves its level alone.
///
/// # Errors
///
/// Returns an error if the name or level is invalid or the store write fails.
pub fn run_add(args: &AddArgs, output: OutputMode, cwd: &Path) -> Result<()> {
    let level: Level = args.level.parse()?;
    let project = Project::discover(cwd)?;
    let (_lock, mut graph) = project.open_write()?;

    let created = graph.upsert_headword(&args.name, level)?;
    let stored = graph
        .store()
        .headword(&args.name)
        .cloned()
        .ok_or_else(|| yoes_core::GraphError::UnknownHeadword(args.name.clone()))?;

    let report = AddReport {
        name: stored.name,
        level: stored.level,
        created,
    };
    render_mode(
        output,
        &report,
        |r, w| {
            let verb = if r.created { "added" } else { "exists" };
            writeln!(w, "{verb} {} level={}", r.name, r.level)
        },
        |r, w| {
            let heading = if r.created {
                "Added headword"
            } else {
                "Headword already exists"
            };
            pretty_section(w, heading)?;
            pretty_kv(w, "name", &r.name)?;
            pretty_kv(w, "level", r.level.to_string())
        },
    )
}
