//! Tracker configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::blacklist::DEFAULT_BLACKLIST_KEYWORDS;
use crate::canonical::DomainFoldPolicy;
use crate::storage::JsonFileStorage;
use crate::validity::DEFAULT_EXCLUDED_HOSTS;

pub const DEFAULT_QUIET_PERIOD_MS: u64 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Storage file path; `None` uses `~/.visited-links.json`.
    pub storage_path: Option<PathBuf>,

    /// Debounce quiet period for batched persistence, in milliseconds.
    pub quiet_period_ms: u64,

    /// Hostname folding policy for canonical keys. Keys written under one
    /// policy are unreadable noise under the other; do not switch over an
    /// existing storage file without re-importing it.
    pub fold_policy: DomainFoldPolicy,

    /// Keywords disqualifying a title/alt from being stored.
    pub blacklist_keywords: Vec<String>,

    /// Page hosts on which the tracker stays idle.
    pub excluded_hosts: Vec<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            storage_path: None,
            quiet_period_ms: DEFAULT_QUIET_PERIOD_MS,
            fold_policy: DomainFoldPolicy::default(),
            blacklist_keywords: DEFAULT_BLACKLIST_KEYWORDS
                .iter()
                .map(|kw| kw.to_string())
                .collect(),
            excluded_hosts: DEFAULT_EXCLUDED_HOSTS
                .iter()
                .map(|h| h.to_string())
                .collect(),
        }
    }
}

impl TrackerConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("could not read config file {:?}", path))?;
                serde_json::from_str::<TrackerConfig>(&content)
                    .with_context(|| format!("could not parse config file {:?}", path))?
            }
            None => TrackerConfig::default(),
        };

        if config.fold_policy != DomainFoldPolicy::default() {
            warn!(
                "⚠️  fold policy is {}: keys are incompatible with data recorded under {}; \
                 re-import through a fresh storage file when switching",
                config.fold_policy.name(),
                DomainFoldPolicy::default().name()
            );
        }

        Ok(config)
    }

    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }

    pub fn storage_path(&self) -> Result<PathBuf> {
        match &self.storage_path {
            Some(path) => Ok(path.clone()),
            None => JsonFileStorage::default_path(),
        }
    }
}
