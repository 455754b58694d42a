#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "keystone: structural analytics for work-item dependency graphs",
    long_about = None
)]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputMode::Text)]
    format: OutputMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Analyze a JSONL export",
        long_about = "Build the dependency graph from a JSONL export and compute centrality, \
                      cycle, and critical-path metrics sized to the graph.",
        after_help = "EXAMPLES:\n    # Analyze with the size-selected plan\n    keystone analyze items.jsonl\n\n    # Exact everything, reproducible sampling, JSON output\n    keystone analyze items.jsonl --force-full --seed 7 --format json"
    )]
    Analyze(cmd::analyze::AnalyzeArgs),

    #[command(
        about = "Show the analysis plan for a graph size",
        long_about = "Print which metrics would run, in which mode, and with what budgets.",
        after_help = "EXAMPLES:\n    # Plan from counts\n    keystone plan --nodes 1500 --edges 9000\n\n    # Plan from a file\n    keystone plan items.jsonl --format json"
    )]
    Plan(cmd::plan::PlanArgs),

    #[command(
        about = "Compare two JSONL exports",
        long_about = "Report items added, removed, or modified between two exports, \
                      including dependency kind changes, and cycles that appeared or were resolved.",
        after_help = "EXAMPLES:\n    # What changed since yesterday's export\n    keystone diff old.jsonl new.jsonl\n\n    # Machine-readable\n    keystone diff old.jsonl new.jsonl --format json"
    )]
    Diff(cmd::diff::DiffArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("KEYSTONE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "keystone=debug,info"
        } else {
            "keystone=info,warn"
        })
    });

    let format = env::var("KEYSTONE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_root = match env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("error: cannot determine working directory: {err}");
            return ExitCode::FAILURE;
        }
    };
    debug!(root = %project_root.display(), "starting");

    let result = match &cli.command {
        Commands::Analyze(args) => cmd::analyze::run_analyze(args, cli.format, &project_root),
        Commands::Plan(args) => cmd::plan::run_plan(args, cli.format, &project_root),
        Commands::Diff(args) => cmd::diff::run_diff(args, cli.format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let rendered = CliError::from_anyhow(&err);
            if render_error(cli.format, &rendered).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
