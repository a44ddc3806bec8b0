//! Visited-record store.
//!
//! Three insertion-ordered, deduplicated collections (canonical link keys,
//! titles, alt texts) plus the pending buffers that accumulate additions
//! between debounced flushes. Rendering only trusts flushed data; the
//! pending buffers exist solely to batch writes.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::blacklist::BlacklistFilter;
use crate::canonical::{canonicalize, DomainFoldPolicy};
use crate::config::TrackerConfig;
use crate::storage::{
    StorageBackend, KEY_VISITED_ALTS, KEY_VISITED_LINKS, KEY_VISITED_TITLES,
};
use crate::validity::ValidityFilter;

/// String set preserving insertion order, so exports are deterministic.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    items: Vec<String>,
    index: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a stored list, collapsing duplicates onto the first
    /// occurrence.
    pub fn from_items(items: Vec<String>) -> Self {
        let mut set = Self::new();
        for item in items {
            set.insert(item);
        }
        set
    }

    /// Returns true when the item was newly added.
    pub fn insert(&mut self, item: impl Into<String>) -> bool {
        let item = item.into();
        if self.index.contains(&item) {
            return false;
        }
        self.index.insert(item.clone());
        self.items.push(item);
        true
    }

    pub fn contains(&self, item: &str) -> bool {
        self.index.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|s| s.as_str())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.items.clone()
    }

    /// Keep only items matching the predicate; returns how many were
    /// removed.
    pub fn retain<F: FnMut(&str) -> bool>(&mut self, mut keep: F) -> usize {
        let before = self.items.len();
        let index = &mut self.index;
        self.items.retain(|item| {
            if keep(item) {
                true
            } else {
                index.remove(item);
                false
            }
        });
        before - self.items.len()
    }

    /// Union of this set followed by `other`'s new entries, in order.
    fn merged_with(&self, other: &VisitedSet) -> Vec<String> {
        let mut merged = self.items.clone();
        merged.extend(other.iter().filter(|i| !self.contains(i)).map(String::from));
        merged
    }

    /// Move every entry of `other` into this set (first occurrence wins).
    fn absorb(&mut self, other: &mut VisitedSet) {
        for item in other.items.drain(..) {
            if !self.index.contains(&item) {
                self.index.insert(item.clone());
                self.items.push(item);
            }
        }
        other.index.clear();
    }
}

/// The unit of persistence, backup export and import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Snapshot {
    #[serde(rename = "visitedLinks", default)]
    pub visited_links: Vec<String>,
    #[serde(rename = "visitedTitles", default)]
    pub visited_titles: Vec<String>,
    #[serde(rename = "visitedAlts", default)]
    pub visited_alts: Vec<String>,
}

/// Result of a blacklist maintenance pass over the persisted sets.
#[derive(Debug, Default)]
pub struct CleanReport {
    pub removed_titles: usize,
    pub removed_alts: usize,
}

impl CleanReport {
    pub fn total_removed(&self) -> usize {
        self.removed_titles + self.removed_alts
    }

    pub fn print_summary(&self) {
        println!("\n🧹 Blacklist clean report");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        if self.total_removed() == 0 {
            println!("✅ No blacklisted entries found");
        } else {
            if self.removed_titles > 0 {
                println!("🏷️  Titles removed: {}", self.removed_titles);
            }
            if self.removed_alts > 0 {
                println!("🖼️  Alt texts removed: {}", self.removed_alts);
            }
        }
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    }
}

pub struct VisitedStore {
    links: VisitedSet,
    titles: VisitedSet,
    alts: VisitedSet,

    pending_links: VisitedSet,
    pending_titles: VisitedSet,
    pending_alts: VisitedSet,

    fold_policy: DomainFoldPolicy,
    validity: ValidityFilter,
    blacklist: BlacklistFilter,
}

impl VisitedStore {
    /// Construct a store for this session from the last-persisted state.
    pub fn load(backend: &dyn StorageBackend, config: &TrackerConfig) -> Result<Self> {
        let links = VisitedSet::from_items(backend.load_list(KEY_VISITED_LINKS)?);
        let titles = VisitedSet::from_items(backend.load_list(KEY_VISITED_TITLES)?);
        let alts = VisitedSet::from_items(backend.load_list(KEY_VISITED_ALTS)?);
        debug!(
            "loaded store: {} links, {} titles, {} alts",
            links.len(),
            titles.len(),
            alts.len()
        );
        Ok(Self {
            links,
            titles,
            alts,
            pending_links: VisitedSet::new(),
            pending_titles: VisitedSet::new(),
            pending_alts: VisitedSet::new(),
            fold_policy: config.fold_policy,
            validity: ValidityFilter::new(&config.excluded_hosts),
            blacklist: BlacklistFilter::new(&config.blacklist_keywords),
        })
    }

    pub fn fold_policy(&self) -> DomainFoldPolicy {
        self.fold_policy
    }

    pub fn links(&self) -> &VisitedSet {
        &self.links
    }

    pub fn titles(&self) -> &VisitedSet {
        &self.titles
    }

    pub fn alts(&self) -> &VisitedSet {
        &self.alts
    }

    /// Accept one activation. Returns true when anything was newly
    /// buffered, which is the caller's cue to re-arm the debounce timer.
    pub fn record(&mut self, url: &str, title: Option<&str>, alt: Option<&str>) -> bool {
        let Some(key) = canonicalize(url, self.fold_policy) else {
            debug!("skipping unparseable URL: {}", url);
            return false;
        };
        if !self.validity.is_valid(url) {
            debug!("skipping non-trackable URL: {}", url);
            return false;
        }

        let mut buffered = false;

        if !self.links.contains(&key) && self.pending_links.insert(key) {
            buffered = true;
        }

        if let Some(title) = title.filter(|t| !t.is_empty()) {
            if self.blacklist.is_blacklisted(title) {
                debug!("skipping blacklisted title: {}", title);
            } else if !self.titles.contains(title) && self.pending_titles.insert(title) {
                buffered = true;
            }
        }

        if let Some(alt) = alt.filter(|a| !a.is_empty()) {
            if self.blacklist.is_blacklisted(alt) {
                debug!("skipping blacklisted alt: {}", alt);
            } else if !self.alts.contains(alt) && self.pending_alts.insert(alt) {
                buffered = true;
            }
        }

        buffered
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_links.is_empty()
            || !self.pending_titles.is_empty()
            || !self.pending_alts.is_empty()
    }

    pub fn pending_counts(&self) -> (usize, usize, usize) {
        (
            self.pending_links.len(),
            self.pending_titles.len(),
            self.pending_alts.len(),
        )
    }

    /// Merge the pending buffers into the persisted sets and write all
    /// three lists out. Returns false when there was nothing to write.
    /// A failed write keeps every buffer intact for the next attempt.
    pub fn flush(&mut self, backend: &dyn StorageBackend) -> Result<bool> {
        if !self.has_pending() {
            debug!("flush with empty buffers, nothing to write");
            return Ok(false);
        }

        let links = self.links.merged_with(&self.pending_links);
        let titles = self.titles.merged_with(&self.pending_titles);
        let alts = self.alts.merged_with(&self.pending_alts);

        backend.save_list(KEY_VISITED_LINKS, &links)?;
        backend.save_list(KEY_VISITED_TITLES, &titles)?;
        backend.save_list(KEY_VISITED_ALTS, &alts)?;

        let (pl, pt, pa) = self.pending_counts();
        self.links.absorb(&mut self.pending_links);
        self.titles.absorb(&mut self.pending_titles);
        self.alts.absorb(&mut self.pending_alts);

        info!("💾 flushed {} links, {} titles, {} alts", pl, pt, pa);
        Ok(true)
    }

    /// Re-read the persisted sets, picking up flushes made by another
    /// session sharing the backend. Pending entries that turn out to be
    /// persisted already are dropped from the buffers.
    pub fn reload(&mut self, backend: &dyn StorageBackend) -> Result<()> {
        self.links = VisitedSet::from_items(backend.load_list(KEY_VISITED_LINKS)?);
        self.titles = VisitedSet::from_items(backend.load_list(KEY_VISITED_TITLES)?);
        self.alts = VisitedSet::from_items(backend.load_list(KEY_VISITED_ALTS)?);

        let links = &self.links;
        self.pending_links.retain(|item| !links.contains(item));
        let titles = &self.titles;
        self.pending_titles.retain(|item| !titles.contains(item));
        let alts = &self.alts;
        self.pending_alts.retain(|item| !alts.contains(item));
        Ok(())
    }

    /// Maintenance pass: drop persisted titles/alts that the current
    /// blacklist rejects, writing back immediately when anything changed.
    pub fn clean(&mut self, backend: &dyn StorageBackend) -> Result<CleanReport> {
        let blacklist = &self.blacklist;
        let removed_titles = self.titles.retain(|t| !blacklist.is_blacklisted(t));
        let removed_alts = self.alts.retain(|a| !blacklist.is_blacklisted(a));
        self.pending_titles.retain(|t| !blacklist.is_blacklisted(t));
        self.pending_alts.retain(|a| !blacklist.is_blacklisted(a));

        let report = CleanReport {
            removed_titles,
            removed_alts,
        };
        if report.total_removed() > 0 {
            backend.save_list(KEY_VISITED_TITLES, self.titles.as_slice())?;
            backend.save_list(KEY_VISITED_ALTS, self.alts.as_slice())?;
            info!(
                "🧹 cleaned {} blacklisted entries from storage",
                report.total_removed()
            );
        }
        Ok(report)
    }

    /// The persisted state as an exportable snapshot, in insertion order.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            visited_links: self.links.to_vec(),
            visited_titles: self.titles.to_vec(),
            visited_alts: self.alts.to_vec(),
        }
    }

    /// Set-union a snapshot into the persisted sets. Returns how many
    /// entries were actually new per field.
    pub fn merge_snapshot(&mut self, snapshot: &Snapshot) -> (usize, usize, usize) {
        let mut added = (0, 0, 0);
        for link in &snapshot.visited_links {
            if self.links.insert(link.clone()) {
                added.0 += 1;
            }
        }
        for title in &snapshot.visited_titles {
            if self.titles.insert(title.clone()) {
                added.1 += 1;
            }
        }
        for alt in &snapshot.visited_alts {
            if self.alts.insert(alt.clone()) {
                added.2 += 1;
            }
        }
        added
    }

    /// Substitute the persisted sets wholesale.
    pub fn replace_snapshot(&mut self, snapshot: Snapshot) {
        self.links = VisitedSet::from_items(snapshot.visited_links);
        self.titles = VisitedSet::from_items(snapshot.visited_titles);
        self.alts = VisitedSet::from_items(snapshot.visited_alts);
    }

    /// Write the persisted sets out immediately, bypassing the debounce
    /// path. Used by import, which must complete before further navigation.
    pub fn persist_all(&self, backend: &dyn StorageBackend) -> Result<()> {
        backend.save_list(KEY_VISITED_LINKS, self.links.as_slice())?;
        backend.save_list(KEY_VISITED_TITLES, self.titles.as_slice())?;
        backend.save_list(KEY_VISITED_ALTS, self.alts.as_slice())?;
        Ok(())
    }
}
