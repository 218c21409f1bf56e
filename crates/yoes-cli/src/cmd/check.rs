//! `yoes check`: validate a teaching order against the stored dependencies.

use crate::cmd::{HostError, Project};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, warn};
use yoes_core::{HierarchyFinding, Violation, build_hierarchy, validate};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Comma-separated order to check instead of the flattened hierarchy.
    #[arg(long, value_delimiter = ',')]
    pub order: Vec<String>,

    /// Exit non-zero on any violation, whatever the project config says.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    order: Vec<String>,
    violations: Vec<Violation>,
    /// Hierarchy findings, only when the order came from the hierarchy.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    findings: Vec<HierarchyFinding>,
}

/// Execute `yoes check`.
///
/// Without `--order`, the hierarchy is built and flattened, and its cycle
/// and unattached findings are reported alongside the violations.
///
/// # Errors
///
/// Returns [`HostError::Violations`] when violations are found and either
/// `--strict` or `sequence.fail_on_violation` is set. Also fails if the store
/// cannot be loaded.
pub fn run_check(args: &CheckArgs, output: OutputMode, cwd: &Path) -> Result<()> {
    let project = Project::discover(cwd)?;
    let (_lock, graph) = project.open_read()?;
    let store = graph.store();

    let (order, findings) = if args.order.is_empty() {
        let forest = build_hierarchy(store);
        (forest.flatten(), forest.findings)
    } else {
        let order: Vec<String> = args
            .order
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        (order, Vec::new())
    };

    let violations = validate(&order, store.depends_edges());
    debug!(
        positions = order.len(),
        violations = violations.len(),
        "sequence checked"
    );

    let count = violations.len();
    let report = CheckReport {
        order,
        violations,
        findings,
    };
    render_mode(output, &report, render_text, render_pretty)?;

    if count > 0 && (args.strict || project.config.sequence.fail_on_violation) {
        warn!(count, "sequence violations are fatal for this project");
        return Err(HostError::Violations(count).into());
    }
    Ok(())
}

fn render_text(r: &CheckReport, w: &mut dyn Write) -> io::Result<()> {
    for v in &r.violations {
        writeln!(w, "{}\t{}\t{}\t{}", v.from, v.to, v.from_pos, v.to_pos)?;
    }
    Ok(())
}

fn render_pretty(r: &CheckReport, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Sequence check")?;
    pretty_kv(w, "positions", r.order.len().to_string())?;
    pretty_kv(w, "violations", r.violations.len().to_string())?;

    for v in &r.violations {
        writeln!(w, "  {v}")?;
    }

    for finding in &r.findings {
        match finding {
            HierarchyFinding::CycleDetected { from, to } => {
                writeln!(w, "warning: subclass cycle at {from} -> {to}")?;
            }
            HierarchyFinding::Unattached { name } => {
                writeln!(w, "note: {name} is not reachable from any root")?;
            }
        }
    }

    if r.violations.is_empty() {
        writeln!(w, "ok")?;
    }
    Ok(())
}
