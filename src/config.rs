use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::workspace::walker::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_MARKER};
use crate::workspace::WalkOptions;

const APP_NAME: &str = "rgq";
const CONFIG_FILE: &str = "config.json";

/// Ordered list of workspace roots, in the platform's path-list syntax
pub const SRCPATH_ENV: &str = "SRCPATH";

/// Overrides the location of the config file
pub const CONFIG_ENV: &str = "RGQ_CONFIG";

/// Application configuration stored in the user's config directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Workspace roots used when SRCPATH is unset
    #[serde(default)]
    pub srcpath: Vec<PathBuf>,

    /// Entries that mark a directory as a repository
    #[serde(default = "default_repo_markers")]
    pub repo_markers: Vec<String>,

    /// Search executable
    #[serde(default = "default_rg_path")]
    pub rg_path: PathBuf,

    /// Pass every repository to one search run instead of one run per repository
    #[serde(default = "default_batch_roots")]
    pub batch_roots: bool,

    /// Walker threads per root (0 = choose automatically)
    #[serde(default)]
    pub walk_threads: usize,

    /// Capacity of the repository discovery channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_repo_markers() -> Vec<String> {
    vec![DEFAULT_MARKER.to_string()]
}

fn default_rg_path() -> PathBuf {
    PathBuf::from("rg")
}

fn default_batch_roots() -> bool {
    true
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            srcpath: Vec::new(),
            repo_markers: default_repo_markers(),
            rg_path: default_rg_path(),
            batch_roots: default_batch_roots(),
            walk_threads: 0,
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl AppConfig {
    /// Load config from the config directory, or return default if not found
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load config from an explicit file, or return default if it does not exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
            let config: AppConfig = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Walker settings derived from this config
    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            markers: self.repo_markers.clone(),
            threads: self.walk_threads,
            channel_capacity: self.channel_capacity,
        }
    }

    /// Workspace roots: SRCPATH, then the configured list, then the current directory
    pub fn workspace_roots(&self) -> Result<Vec<PathBuf>> {
        resolve_roots(std::env::var_os(SRCPATH_ENV), &self.srcpath, || {
            std::env::current_dir().context("Could not determine current directory")
        })
    }
}

fn resolve_roots(
    env: Option<OsString>,
    configured: &[PathBuf],
    cwd: impl FnOnce() -> Result<PathBuf>,
) -> Result<Vec<PathBuf>> {
    let from_env: Vec<PathBuf> = env
        .map(|value| {
            std::env::split_paths(&value)
                .filter(|p| !p.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default();

    if !from_env.is_empty() {
        Ok(from_env)
    } else if !configured.is_empty() {
        Ok(configured.to_vec())
    } else {
        Ok(vec![cwd()?])
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    let base = dirs::config_dir().context("Could not determine config directory")?;
    Ok(base.join(APP_NAME).join(CONFIG_FILE))
}
