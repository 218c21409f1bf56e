//! `yoes level`: change the declared depth of a headword.

use crate::cmd::Project;
use crate::output::{OutputMode, render_mode};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use yoes_core::{GraphError, Level};

#[derive(Args, Debug)]
pub struct LevelArgs {
    /// Headword to update.
    pub name: String,

    /// New level: `unknown`, `-1`, or a non-negative depth.
    #[arg(allow_negative_numbers = true)]
    pub level: String,
}

#[derive(Debug, Serialize)]
struct LevelReport {
    name: String,
    previous: Level,
    level: Level,
}

/// Execute `yoes level <name> <level>`.
///
/// # Errors
///
/// Returns an error if the headword is unknown, the level is invalid, or the
/// store write fails.
pub fn run_level(args: &LevelArgs, output: OutputMode, cwd: &Path) -> Result<()> {
    let level: Level = args.level.parse()?;
    let project = Project::discover(cwd)?;
    let (_lock, mut graph) = project.open_write()?;

    let current = graph
        .store()
        .headword(&args.name)
        .cloned()
        .ok_or_else(|| GraphError::UnknownHeadword(args.name.clone()))?;
    graph.set_level(&current.name, level)?;

    let report = LevelReport {
        name: current.name,
        previous: current.level,
        level,
    };
    let line = |r: &LevelReport, w: &mut dyn Write| {
        writeln!(w, "{}: {} -> {}", r.name, r.previous, r.level)
    };
    render_mode(output, &report, line, line)
}
