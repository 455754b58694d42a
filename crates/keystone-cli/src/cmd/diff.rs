//! `keystone diff`: compare two exports of the same work-item set.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use keystone_triage::{Snapshot, SnapshotDiff, compare_snapshots};

use crate::output::{OutputMode, kv, render, rule, section};

/// Arguments for `keystone diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Older JSONL export.
    #[arg(value_name = "FROM")]
    pub from: PathBuf,

    /// Newer JSONL export.
    #[arg(value_name = "TO")]
    pub to: PathBuf,
}

/// Execute `keystone diff`.
pub fn run_diff(args: &DiffArgs, output: OutputMode) -> anyhow::Result<()> {
    let from = Snapshot::new(&super::load_items(&args.from)?);
    let to = Snapshot::new(&super::load_items(&args.to)?);
    let diff = compare_snapshots(&from, &to);
    render(output, &diff, render_diff_text)
}

fn render_diff_text(diff: &SnapshotDiff, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "Snapshot diff")?;
    rule(w)?;
    kv(w, "from", &diff.from_hash)?;
    kv(w, "to", &diff.to_hash)?;
    kv(
        w,
        "graph",
        if diff.graph_changed {
            "changed"
        } else {
            "unchanged"
        },
    )?;

    if diff.is_empty() {
        writeln!(w)?;
        writeln!(w, "No changes.")?;
        return Ok(());
    }

    if !diff.added.is_empty() {
        section(w, &format!("Added ({})", diff.added.len()))?;
        for id in &diff.added {
            writeln!(w, "  + {id}")?;
        }
    }
    if !diff.removed.is_empty() {
        section(w, &format!("Removed ({})", diff.removed.len()))?;
        for id in &diff.removed {
            writeln!(w, "  - {id}")?;
        }
    }
    if !diff.modified.is_empty() {
        section(w, &format!("Modified ({})", diff.modified.len()))?;
        for item in &diff.modified {
            writeln!(w, "  ~ {}", item.id)?;
            for change in &item.changes {
                writeln!(w, "      {}: {:?} -> {:?}", change.field, change.from, change.to)?;
            }
        }
    }
    if !diff.new_cycles.is_empty() || !diff.resolved_cycles.is_empty() {
        section(w, "Cycles")?;
        for cycle in &diff.new_cycles {
            writeln!(w, "  new       {}", cycle_path(cycle))?;
        }
        for cycle in &diff.resolved_cycles {
            writeln!(w, "  resolved  {}", cycle_path(cycle))?;
        }
    }
    if diff.cycles_partial {
        writeln!(w)?;
        writeln!(w, "note: cycle enumeration stopped early; cycle lists may be incomplete")?;
    }
    Ok(())
}

fn cycle_path(cycle: &[String]) -> String {
    let mut path = cycle.join(" -> ");
    if let Some(first) = cycle.first() {
        path.push_str(" -> ");
        path.push_str(first);
    }
    path
}
