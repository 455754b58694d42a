pub mod analyze;
pub mod diff;
pub mod plan;

use std::path::Path;

use anyhow::Context;
use keystone_core::WorkItem;
use keystone_core::ingest::load_jsonl;
use tracing::warn;

/// Load the JSONL export at `path`, warning when it holds no items.
pub(crate) fn load_items(path: &Path) -> anyhow::Result<Vec<WorkItem>> {
    let items = load_jsonl(path).with_context(|| format!("loading {}", path.display()))?;
    if items.is_empty() {
        warn!(path = %path.display(), "input contains no work items");
    }
    Ok(items)
}
