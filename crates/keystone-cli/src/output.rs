//! Shared output layer: text for humans, JSON for agents and pipes.
//!
//! Every command handler receives an [`OutputMode`] and renders through
//! [`render`]. Errors go to stderr through [`render_error`] in the same mode,
//! carrying a stable `E####` code from [`ErrorCode`].

use std::io::{self, Write};

use clap::ValueEnum;
use keystone_core::error::ErrorCode;
use keystone_core::ingest::IngestError;
use serde::Serialize;

/// Shared width for text separators.
pub const RULE_WIDTH: usize = 72;

/// Write a horizontal separator.
pub fn rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w)?;
    writeln!(w, "{heading}")?;
    rule(w)
}

/// Render a left-aligned key/value line.
pub fn kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<14} {}", format!("{key}:"), value.as_ref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputMode {
    /// Human-readable report.
    #[default]
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Render a serializable value to stdout in the requested format.
///
/// JSON mode serializes `value`; text mode calls `text_fn`.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, &mut out)?,
    }
    Ok(())
}

/// A structured error with a stable code and optional hint.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    pub error_code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

impl CliError {
    /// Classify `err` by walking its cause chain.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let code = classify(err);
        Self {
            message: format!("{}: {err:#}", code.message()),
            error_code: code.code(),
            hint: code.hint(),
        }
    }
}

fn classify(err: &anyhow::Error) -> ErrorCode {
    for cause in err.chain() {
        if let Some(ingest) = cause.downcast_ref::<IngestError>() {
            return ingest.code();
        }
        if cause.downcast_ref::<toml::de::Error>().is_some() {
            return ErrorCode::ConfigParseError;
        }
        if cause.downcast_ref::<rayon::ThreadPoolBuildError>().is_some() {
            return ErrorCode::WorkerPoolUnavailable;
        }
    }
    ErrorCode::InternalUnexpected
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({ "error": error });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Text => {
            writeln!(out, "error[{}]: {}", error.error_code, error.message)?;
            if let Some(hint) = error.hint {
                writeln!(out, "  hint: {hint}")?;
            }
        }
    }
    Ok(())
}
