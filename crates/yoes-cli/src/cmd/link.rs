//! `yoes link`: create or retype the edge between two headwords.

use crate::cmd::Project;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;
use yoes_core::{Edge, EdgeKind};

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Source headword.
    pub from: String,

    /// Target headword.
    pub to: String,

    /// Edge kind: undefined, depends, subclass, rdepends, superclass.
    #[arg(long, short, default_value = "undefined")]
    pub kind: String,
}

#[derive(Debug, Serialize)]
struct LinkReport {
    /// The edge as stored, after inverse kinds are turned around.
    stored: Edge,
    #[serde(skip_serializing_if = "Option::is_none")]
    replaced: Option<EdgeKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    removed_reverse: Option<Edge>,
}

/// Execute `yoes link <from> <to> --kind <kind>`.
///
/// # Errors
///
/// Returns an error if either headword is unknown, both name the same
/// headword, the kind is invalid, or the store write fails.
pub fn run_link(args: &LinkArgs, output: OutputMode, cwd: &Path) -> Result<()> {
    let kind: EdgeKind = args.kind.parse()?;
    let project = Project::discover(cwd)?;
    let (_lock, mut graph) = project.open_write()?;

    let commit = graph.commit_edge(&args.from, &args.to, kind)?;
    let report = LinkReport {
        stored: commit.stored,
        replaced: commit.replaced,
        removed_reverse: commit.removed_reverse,
    };
    render_mode(
        output,
        &report,
        |r, w| writeln!(w, "linked {}", r.stored),
        |r, w| {
            pretty_section(w, "Linked")?;
            pretty_kv(w, "edge", r.stored.to_string())?;
            if let Some(previous) = r.replaced {
                pretty_kv(w, "replaced", previous.to_string())?;
            }
            if let Some(reverse) = &r.removed_reverse {
                pretty_kv(w, "dropped", reverse.to_string())?;
            }
            Ok(())
        },
    )
}
