//! JSONL ingestion of work-item records.
//!
//! One JSON object per line; blank lines are skipped. Records only need an
//! `id`; everything else defaults (see [`WorkItem`]).

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::error::ErrorCode;
use crate::model::WorkItem;

/// Errors produced while reading a JSONL export.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to open {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read line {line}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: malformed work item")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl IngestError {
    /// Stable error code for CLI rendering.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Open { .. } => ErrorCode::InputNotFound,
            Self::Read { .. } | Self::Parse { .. } => ErrorCode::InputParseError,
        }
    }
}

/// Load every work item from the JSONL file at `path`.
///
/// # Errors
///
/// Returns [`IngestError::Open`] if the file cannot be opened, or the first
/// read/parse failure with its 1-based line number.
#[instrument]
pub fn load_jsonl(path: &Path) -> Result<Vec<WorkItem>, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let items = read_jsonl(file)?;
    debug!(count = items.len(), "loaded work items");
    Ok(items)
}

/// Parse work items from any reader producing JSONL.
///
/// # Errors
///
/// Returns the first read or parse failure with its 1-based line number.
pub fn read_jsonl(reader: impl Read) -> Result<Vec<WorkItem>, IngestError> {
    let mut items = Vec::new();
    for (idx, line) in BufReader::new(reader).lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|source| IngestError::Read {
            line: line_no,
            source,
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let item = serde_json::from_str::<WorkItem>(trimmed).map_err(|source| {
            IngestError::Parse {
                line: line_no,
                source,
            }
        })?;
        items.push(item);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DependencyKind;

    #[test]
    fn parses_items_and_skips_blank_lines() {
        let input = r#"{"id":"bd-1","title":"root"}

{"id":"bd-2","dependencies":[{"depends_on_id":"bd-1","type":"blocks"}]}
"#;
        let items = read_jsonl(input.as_bytes()).expect("parse");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "root");
        assert_eq!(items[1].dependencies[0].depends_on_id, "bd-1");
        assert_eq!(items[1].dependencies[0].kind, DependencyKind::Blocks);
    }

    #[test]
    fn parse_error_reports_line_number() {
        let input = "{\"id\":\"bd-1\"}\n\nnot json\n";
        let err = read_jsonl(input.as_bytes()).expect_err("should fail");
        match err {
            IngestError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_file_maps_to_input_not_found() {
        let err = load_jsonl(Path::new("/definitely/not/here.jsonl")).expect_err("missing");
        assert_eq!(err.code(), ErrorCode::InputNotFound);
    }
}
