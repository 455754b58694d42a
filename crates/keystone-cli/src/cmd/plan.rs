//! `keystone plan`: show which metrics a graph of a given size would get.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use keystone_core::config::resolve_settings;
use keystone_triage::plan::{MetricPlan, SkippedMetric, density};
use keystone_triage::{AnalysisConfig, GraphView, select_config};
use serde::Serialize;

use crate::output::{OutputMode, kv, render, rule, section};

/// Arguments for `keystone plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// JSONL export to size the plan from.
    #[arg(value_name = "FILE", required_unless_present = "nodes", conflicts_with = "nodes")]
    pub file: Option<PathBuf>,

    /// Node count, instead of reading a file.
    #[arg(long, requires = "edges")]
    pub nodes: Option<usize>,

    /// Edge count, used with --nodes.
    #[arg(long, requires = "nodes")]
    pub edges: Option<usize>,

    /// Plan as if full analysis were forced.
    #[arg(long)]
    pub force_full: bool,
}

/// Report payload for `keystone plan`.
#[derive(Debug, Serialize)]
pub struct PlanReport {
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
    pub config: AnalysisConfig,
    pub skipped: Vec<SkippedMetric>,
}

impl PlanReport {
    fn new(node_count: usize, edge_count: usize, force_full: bool) -> Self {
        let config = select_config(node_count, edge_count, force_full);
        Self {
            node_count,
            edge_count,
            density: density(node_count, edge_count),
            skipped: config.skipped_metrics(),
            config,
        }
    }
}

/// Execute `keystone plan`.
pub fn run_plan(args: &PlanArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let force_full = args.force_full || resolve_settings(project_root)?.analysis.force_full;

    let (nodes, edges) = match (&args.file, args.nodes, args.edges) {
        (Some(path), _, _) => {
            let graph = GraphView::from_items(&super::load_items(path)?);
            (graph.node_count(), graph.edge_count())
        }
        (None, Some(nodes), edges) => (nodes, edges.unwrap_or(0)),
        (None, None, _) => anyhow::bail!("either FILE or --nodes/--edges is required"),
    };

    let report = PlanReport::new(nodes, edges, force_full);
    render(output, &report, render_plan_text)
}

fn render_plan_text(report: &PlanReport, w: &mut dyn Write) -> io::Result<()> {
    let config = &report.config;

    writeln!(w, "Analysis plan")?;
    rule(w)?;
    kv(w, "items", report.node_count.to_string())?;
    kv(w, "edges", report.edge_count.to_string())?;
    kv(w, "density", format!("{:.5}", report.density))?;
    kv(w, "tier", config.tier.to_string())?;

    section(w, "Metrics")?;
    let betweenness = &config.betweenness;
    let detail = if betweenness.enabled() {
        if betweenness.sample_size > 0 {
            format!("{} ({} pivots)", betweenness.mode, betweenness.sample_size)
        } else {
            betweenness.mode.to_string()
        }
    } else {
        format!("skip: {}", betweenness.skip_reason.as_deref().unwrap_or(""))
    };
    writeln!(
        w,
        "{:<14} {:>8}ms  {detail}",
        "betweenness",
        betweenness.timeout.as_millis()
    )?;
    metric_line(w, "pagerank", &config.pagerank)?;
    metric_line(w, "eigenvector", &config.eigenvector)?;
    metric_line(w, "hits", &config.hits)?;
    metric_line(w, "cycles", &config.cycles)?;
    let cap = if config.max_cycles_to_store == usize::MAX {
        "unlimited".to_string()
    } else {
        config.max_cycles_to_store.to_string()
    };
    kv(w, "cycle cap", cap)?;
    kv(
        w,
        "critical path",
        if config.critical_path { "on" } else { "off" },
    )?;
    Ok(())
}

fn metric_line(w: &mut dyn Write, name: &str, plan: &MetricPlan) -> io::Result<()> {
    if plan.enabled {
        writeln!(w, "{name:<14} {:>8}ms  run", plan.timeout.as_millis())
    } else {
        writeln!(
            w,
            "{name:<14} {:>10}  skip: {}",
            "-",
            plan.skip_reason.as_deref().unwrap_or("")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_triage::BetweennessMode;

    #[test]
    fn report_carries_skip_reasons() {
        let report = PlanReport::new(1000, 20_000, false);
        assert_eq!(report.config.betweenness.mode, BetweennessMode::Skip);
        assert_eq!(report.skipped.len(), 1);
        assert!((report.density - 20_000.0 / 999_000.0).abs() < 1e-12);
    }

    #[test]
    fn text_plan_shows_sampling_and_skips() {
        let report = PlanReport::new(5000, 30_000, false);
        let mut buf = Vec::new();
        render_plan_text(&report, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("approximate (200 pivots)"), "{text}");
        assert!(text.contains("skip: graph too large (>2000 nodes)"));
        assert!(text.contains("skip: graph too large and dense"));
        assert!(text.contains("tier:"));
    }

    #[test]
    fn forced_plan_has_no_cycle_cap() {
        let report = PlanReport::new(10, 5, true);
        let mut buf = Vec::new();
        render_plan_text(&report, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("unlimited"));
        assert!(report.skipped.is_empty());
    }
}
