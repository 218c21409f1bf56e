//! `yoes list`: every headword with its level and edge counts.

use crate::cmd::Project;
use crate::output::{OutputMode, pretty_rule, render_mode};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;
use yoes_core::Level;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list headwords at this level (`unknown`, `-1`, or a depth).
    #[arg(long, allow_negative_numbers = true)]
    pub level: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListEntry {
    name: String,
    level: Level,
    outgoing: usize,
    incoming: usize,
}

/// Execute `yoes list`. Headwords come out in key order.
///
/// # Errors
///
/// Returns an error if the level filter is invalid or the store cannot be
/// loaded.
pub fn run_list(args: &ListArgs, output: OutputMode, cwd: &Path) -> Result<()> {
    let filter = args.level.as_deref().map(str::parse::<Level>).transpose()?;
    let project = Project::discover(cwd)?;
    let (_lock, graph) = project.open_read()?;
    let store = graph.store();

    let entries: Vec<ListEntry> = store
        .all_headwords()
        .into_iter()
        .filter(|headword| filter.is_none_or(|level| headword.level == level))
        .map(|headword| ListEntry {
            name: headword.name.clone(),
            level: headword.level,
            outgoing: store.edges_from(&headword.name).len(),
            incoming: store.edges_to(&headword.name).len(),
        })
        .collect();

    render_mode(
        output,
        &entries,
        |entries, w| {
            for e in entries {
                writeln!(w, "{}\t{}\t{}\t{}", e.name, e.level, e.outgoing, e.incoming)?;
            }
            Ok(())
        },
        |entries, w| {
            writeln!(w, "{:<32} {:>8} {:>5} {:>5}", "HEADWORD", "LEVEL", "OUT", "IN")?;
            pretty_rule(w)?;
            for e in entries {
                writeln!(
                    w,
                    "{:<32} {:>8} {:>5} {:>5}",
                    e.name,
                    e.level.to_string(),
                    e.outgoing,
                    e.incoming
                )?;
            }
            if entries.is_empty() {
                writeln!(w, "(no headwords)")?;
            }
            Ok(())
        },
    )
}
