//! `keystone analyze`: full structural analysis of a JSONL export.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use keystone_core::config::{Settings, resolve_settings};
use keystone_triage::{Analyzer, AnalyzerOptions, GraphStats, MetricStatus};
use tracing::debug;

use crate::output::{OutputMode, kv, render, rule, section};

/// Arguments for `keystone analyze`.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// JSONL export, one work item per line.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Ignore size tiers and run every metric exactly.
    #[arg(long)]
    pub force_full: bool,

    /// Worker threads for sampled betweenness (0 = one per core).
    #[arg(long)]
    pub workers: Option<usize>,

    /// Seed for betweenness pivot sampling.
    #[arg(long)]
    pub seed: Option<u64>,

    /// How many items to list per ranking in text output.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

impl AnalyzeArgs {
    /// Apply command-line overrides on top of the loaded settings.
    fn apply(&self, settings: &mut Settings) {
        if self.force_full {
            settings.analysis.force_full = true;
        }
        if let Some(workers) = self.workers {
            settings.analysis.workers = workers;
        }
        if let Some(seed) = self.seed {
            settings.analysis.seed = Some(seed);
        }
    }
}

/// Execute `keystone analyze`.
pub fn run_analyze(args: &AnalyzeArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let mut settings = resolve_settings(project_root)?;
    args.apply(&mut settings);
    debug!(?settings, "effective settings");

    let items = super::load_items(&args.file)?;
    let stats = Analyzer::new(&items)
        .force_full(settings.analysis.force_full)
        .with_options(AnalyzerOptions::from_settings(&settings))
        .analyze()?;

    render(output, &stats, |stats, w| {
        render_analyze_text(stats, args.top, w)
    })
}

fn render_analyze_text(stats: &GraphStats, top: usize, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "Dependency graph analysis")?;
    rule(w)?;
    kv(w, "items", stats.node_count.to_string())?;
    kv(w, "edges", stats.edge_count.to_string())?;
    kv(w, "density", format!("{:.5}", stats.density))?;
    if let Some(tier) = stats.tier {
        kv(w, "tier", tier.to_string())?;
    }
    kv(w, "hash", &stats.content_hash)?;
    if stats.dropped_edges > 0 {
        kv(w, "dropped", format!("{} unknown dependencies", stats.dropped_edges))?;
    }

    section(w, "Metrics")?;
    for outcome in &stats.outcomes {
        let status = match &outcome.status {
            MetricStatus::Computed => "computed".to_string(),
            MetricStatus::TimedOut => "timed out (partial)".to_string(),
            MetricStatus::Skipped { reason } => format!("skipped: {reason}"),
            MetricStatus::NotApplicable { reason } => format!("n/a: {reason}"),
        };
        writeln!(
            w,
            "{:<18} {:>8}ms  {status}",
            outcome.metric.as_str(),
            outcome.elapsed.as_millis()
        )?;
    }
    if let Some(run) = &stats.betweenness_run {
        writeln!(
            w,
            "betweenness: {} ({} of {} pivots)",
            run.mode, run.pivots_completed, run.sample_size
        )?;
    }

    ranking(w, "Critical path (longest chains)", &stats.critical_path_score, top)?;
    ranking(w, "Betweenness (bottlenecks)", &stats.betweenness, top)?;
    ranking(w, "PageRank (foundational)", &stats.page_rank, top)?;

    if !stats.cycles.is_empty() {
        let heading = if stats.cycles_truncated {
            format!("Cycles ({}, truncated)", stats.cycles.len())
        } else {
            format!("Cycles ({})", stats.cycles.len())
        };
        section(w, &heading)?;
        for cycle in stats.cycles.iter().take(top) {
            let mut path = cycle.join(" -> ");
            if let Some(first) = cycle.first() {
                path.push_str(" -> ");
                path.push_str(first);
            }
            writeln!(w, "{path}")?;
        }
    }

    Ok(())
}

fn ranking(
    w: &mut dyn Write,
    heading: &str,
    scores: &HashMap<String, f64>,
    top: usize,
) -> io::Result<()> {
    if scores.is_empty() || top == 0 {
        return Ok(());
    }
    section(w, heading)?;
    for (rank, (id, score)) in GraphStats::top(scores, top).into_iter().enumerate() {
        writeln!(w, "{:>3}. {id:<24} {score:.4}", rank + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_core::WorkItem;
    use keystone_triage::analyze;

    fn args() -> AnalyzeArgs {
        AnalyzeArgs {
            file: PathBuf::from("items.jsonl"),
            force_full: false,
            workers: None,
            seed: None,
            top: 3,
        }
    }

    #[test]
    fn flags_override_settings() {
        let mut settings = Settings::default();
        settings.analysis.workers = 8;
        let args = AnalyzeArgs {
            force_full: true,
            workers: Some(2),
            seed: Some(5),
            ..args()
        };
        args.apply(&mut settings);
        assert!(settings.analysis.force_full);
        assert_eq!(settings.analysis.workers, 2);
        assert_eq!(settings.analysis.seed, Some(5));
    }

    #[test]
    fn absent_flags_keep_settings() {
        let mut settings = Settings::default();
        settings.analysis.seed = Some(9);
        args().apply(&mut settings);
        assert_eq!(settings.analysis.seed, Some(9));
        assert!(!settings.analysis.force_full);
    }

    #[test]
    fn text_report_lists_rankings_and_cycles() {
        let items = vec![
            WorkItem::new("A").depends_on("B"),
            WorkItem::new("B").depends_on("A"),
            WorkItem::new("C").depends_on("A"),
        ];
        let stats = analyze(&items).expect("analyze");
        let mut buf = Vec::new();
        render_analyze_text(&stats, 3, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");

        assert!(text.contains("items:"));
        assert!(text.contains("Cycles (1)"));
        assert!(text.contains("A -> B -> A"));
        assert!(text.contains("n/a: graph contains a dependency cycle"));
        assert!(!text.contains("Critical path"));
    }
}
