//! Engine settings loaded from `.keystone/config.toml`.
//!
//! Resolution order (first hit wins): the project file
//! `<root>/.keystone/config.toml`, then the user file
//! `<config_dir>/keystone/config.toml`, then [`Settings::default`].
//! `KEYSTONE_FORCE_FULL` (truthy) forces full analysis on top of whichever
//! file was used. CLI flags are applied by the caller after this.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub pagerank: PageRankSettings,
    #[serde(default)]
    pub hits: HitsSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AnalysisSettings {
    /// Ignore size tiers and run every metric exactly.
    #[serde(default)]
    pub force_full: bool,
    /// Worker threads for sampled betweenness; 0 means one per core.
    #[serde(default)]
    pub workers: usize,
    /// Fixed RNG seed for pivot sampling. Unset draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRankSettings {
    #[serde(default = "default_damping")]
    pub damping: f64,
    #[serde(default = "default_pagerank_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
}

impl Default for PageRankSettings {
    fn default() -> Self {
        Self {
            damping: default_damping(),
            tolerance: default_pagerank_tolerance(),
            max_iter: default_max_iter(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitsSettings {
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    #[serde(default = "default_hits_tolerance")]
    pub tolerance: f64,
}

impl Default for HitsSettings {
    fn default() -> Self {
        Self {
            max_iter: default_max_iter(),
            tolerance: default_hits_tolerance(),
        }
    }
}

/// Path of the project-level settings file under `project_root`.
#[must_use]
pub fn project_settings_path(project_root: &Path) -> PathBuf {
    project_root.join(".keystone/config.toml")
}

/// Load `<root>/.keystone/config.toml`, or `None` if it does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_settings(project_root: &Path) -> Result<Option<Settings>> {
    load_settings_file(&project_settings_path(project_root))
}

/// Load `<config_dir>/keystone/config.toml`, or `None` if absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_settings() -> Result<Option<Settings>> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(None);
    };
    load_settings_file(&config_dir.join("keystone/config.toml"))
}

/// Load one settings file. Missing files are `Ok(None)`.
///
/// # Errors
///
/// Returns an error naming the path if reading or TOML parsing fails.
pub fn load_settings_file(path: &Path) -> Result<Option<Settings>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let settings = toml::from_str::<Settings>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    debug!(path = %path.display(), "loaded settings");
    Ok(Some(settings))
}

/// Resolve effective settings for `project_root`.
///
/// # Errors
///
/// Returns an error if a settings file exists but is malformed.
pub fn resolve_settings(project_root: &Path) -> Result<Settings> {
    let mut settings = match load_project_settings(project_root)? {
        Some(settings) => settings,
        None => load_user_settings()?.unwrap_or_default(),
    };

    if env::var("KEYSTONE_FORCE_FULL")
        .ok()
        .is_some_and(|value| is_truthy(&value))
    {
        settings.analysis.force_full = true;
    }

    Ok(settings)
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

const fn default_damping() -> f64 {
    0.85
}

const fn default_pagerank_tolerance() -> f64 {
    1e-6
}

const fn default_hits_tolerance() -> f64 {
    1e-8
}

const fn default_max_iter() -> usize {
    100
}
