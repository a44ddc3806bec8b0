//! Snapshot backup and import.
//!
//! Export writes the three persisted sets as pretty JSON under a
//! timestamped filename. Import validates the candidate's shape strictly
//! before touching any state, merges by set union, and persists
//! immediately: imports are rare and user-initiated, so they bypass the
//! debounce path.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::storage::StorageBackend;
use crate::store::{Snapshot, VisitedStore};

pub const SNAPSHOT_FIELDS: &[&str] = &["visitedLinks", "visitedTitles", "visitedAlts"];

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid file format: expected visitedLinks, visitedTitles and visitedAlts string arrays")]
    MalformedFormat,
    #[error("could not parse file as JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("could not write imported data: {0}")]
    Write(#[source] anyhow::Error),
}

/// What an import actually changed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub added_links: usize,
    pub added_titles: usize,
    pub added_alts: usize,
}

impl ImportStats {
    pub fn total_added(&self) -> usize {
        self.added_links + self.added_titles + self.added_alts
    }
}

/// `visited-links-backup-<ISO8601 with ':' and '.' replaced by '-'>.json`
pub fn backup_filename(now: DateTime<Utc>) -> String {
    let timestamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("visited-links-backup-{}.json", timestamp)
}

/// Serialize the persisted sets to a timestamped file in `output_dir`.
pub fn export_snapshot(store: &VisitedStore, output_dir: &Path) -> Result<PathBuf> {
    let snapshot = store.snapshot();
    let path = output_dir.join(backup_filename(Utc::now()));
    let data = serde_json::to_string_pretty(&snapshot)?;
    fs::write(&path, data).with_context(|| format!("could not write backup file {:?}", path))?;
    info!(
        "📦 exported {} links, {} titles, {} alts to {:?}",
        snapshot.visited_links.len(),
        snapshot.visited_titles.len(),
        snapshot.visited_alts.len(),
        path
    );
    Ok(path)
}

/// Strict structural validation: all three fields must be present and be
/// arrays of strings. Anything else is malformed and must not reach the
/// store.
pub fn parse_snapshot(raw: &str) -> Result<Snapshot, ImportError> {
    let value: Value = serde_json::from_str(raw)?;
    let Some(object) = value.as_object() else {
        return Err(ImportError::MalformedFormat);
    };
    for field in SNAPSHOT_FIELDS {
        let Some(array) = object.get(*field).and_then(|v| v.as_array()) else {
            return Err(ImportError::MalformedFormat);
        };
        if array.iter().any(|item| !item.is_string()) {
            return Err(ImportError::MalformedFormat);
        }
    }
    serde_json::from_value(value).map_err(|_| ImportError::MalformedFormat)
}

/// Lenient parse for `--replace`: missing fields become empty sets.
pub fn parse_snapshot_lenient(raw: &str) -> Result<Snapshot, ImportError> {
    Ok(serde_json::from_str(raw)?)
}

/// Merge (or replace with) an external snapshot and write the result
/// durably in one step.
pub fn import_snapshot(
    store: &mut VisitedStore,
    backend: &dyn StorageBackend,
    raw: &str,
    replace: bool,
) -> Result<ImportStats, ImportError> {
    let stats = if replace {
        let snapshot = parse_snapshot_lenient(raw)?;
        let stats = ImportStats {
            added_links: snapshot.visited_links.len(),
            added_titles: snapshot.visited_titles.len(),
            added_alts: snapshot.visited_alts.len(),
        };
        store.replace_snapshot(snapshot);
        stats
    } else {
        let snapshot = parse_snapshot(raw)?;
        let (added_links, added_titles, added_alts) = store.merge_snapshot(&snapshot);
        ImportStats {
            added_links,
            added_titles,
            added_alts,
        }
    };

    store.persist_all(backend).map_err(ImportError::Write)?;
    info!(
        "📥 imported {} new links, {} new titles, {} new alts",
        stats.added_links, stats.added_titles, stats.added_alts
    );
    Ok(stats)
}
