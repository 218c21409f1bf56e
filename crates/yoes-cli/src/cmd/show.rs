//! `yoes show`: one headword with its edges and place in the hierarchy.

use crate::cmd::Project;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use yoes_core::{EdgeKind, GraphError, Level, build_hierarchy};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Headword to display. Matching ignores case and spacing.
    pub name: String,
}

/// One neighbour of the shown headword.
#[derive(Debug, Serialize)]
struct Neighbour {
    name: String,
    kind: EdgeKind,
}

#[derive(Debug, Serialize)]
struct ShowReport {
    name: String,
    level: Level,
    /// Position in the flattened hierarchy, if the headword is placed.
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<usize>,
    /// Edges stored from this headword.
    outgoing: Vec<Neighbour>,
    /// Edges stored towards this headword.
    incoming: Vec<Neighbour>,
}

/// Execute `yoes show <name>`.
///
/// # Errors
///
/// Returns an error if the headword is unknown or the store cannot be loaded.
pub fn run_show(args: &ShowArgs, output: OutputMode, cwd: &Path) -> Result<()> {
    let project = Project::discover(cwd)?;
    let (_lock, graph) = project.open_read()?;
    let store = graph.store();

    let headword = store
        .headword(&args.name)
        .ok_or_else(|| GraphError::UnknownHeadword(args.name.clone()))?;

    let order = build_hierarchy(store).flatten();
    let report = ShowReport {
        name: headword.name.clone(),
        level: headword.level,
        position: order.iter().position(|placed| *placed == headword.name),
        outgoing: store
            .edges_from(&headword.name)
            .into_iter()
            .map(|edge| Neighbour {
                name: edge.to,
                kind: edge.kind,
            })
            .collect(),
        incoming: store
            .edges_to(&headword.name)
            .into_iter()
            .map(|edge| Neighbour {
                name: edge.from,
                kind: edge.kind,
            })
            .collect(),
    };

    render_mode(output, &report, render_text, render_pretty)
}

fn render_text(r: &ShowReport, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "name\t{}", r.name)?;
    writeln!(w, "level\t{}", r.level)?;
    if let Some(position) = r.position {
        writeln!(w, "position\t{position}")?;
    }
    for n in &r.outgoing {
        writeln!(w, "out\t{}\t{}", n.kind, n.name)?;
    }
    for n in &r.incoming {
        writeln!(w, "in\t{}\t{}", n.kind, n.name)?;
    }
    Ok(())
}

fn render_pretty(r: &ShowReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &r.name)?;
    pretty_kv(w, "level", r.level.to_string())?;
    pretty_kv(
        w,
        "position",
        r.position
            .map_or_else(|| "unattached".to_string(), |p| format!("#{p}")),
    )?;

    if !r.outgoing.is_empty() {
        writeln!(w)?;
        writeln!(w, "Outgoing")?;
        for n in &r.outgoing {
            writeln!(w, "  -[{}]-> {}", n.kind, n.name)?;
        }
    }
    if !r.incoming.is_empty() {
        writeln!(w)?;
        writeln!(w, "Incoming")?;
        for n in &r.incoming {
            writeln!(w, "  {} -[{}]->", n.name, n.kind)?;
        }
    }
    Ok(())
}
