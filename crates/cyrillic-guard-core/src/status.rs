//! Per-tab status bookkeeping
//!
//! The store is owned by the coordinator and is the only place tab status
//! lives. URL and page flags are written independently so neither update can
//! erase the other.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Browser tab identifier
pub type TabId = i32;

/// Detection flags for one tab
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabStatus {
    pub url_has_cyrillic: bool,
    pub page_has_cyrillic: bool,
}

impl TabStatus {
    /// True if either the URL or the page content was flagged
    pub fn combined(&self) -> bool {
        self.url_has_cyrillic || self.page_has_cyrillic
    }
}

/// Tab status keyed by tab id
#[derive(Debug, Default)]
pub struct TabStatusStore {
    entries: HashMap<TabId, TabStatus>,
}

impl TabStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored status, or both flags false for an unseen tab
    pub fn get(&self, tab_id: TabId) -> TabStatus {
        self.entries.get(&tab_id).copied().unwrap_or_default()
    }

    #[cfg(test)]
    fn contains(&self, tab_id: TabId) -> bool {
        self.entries.contains_key(&tab_id)
    }

    /// Record the latest URL observation, keeping the page flag
    pub fn set_url_flag(&mut self, tab_id: TabId, has_cyrillic: bool) -> TabStatus {
        let entry = self.entries.entry(tab_id).or_default();
        entry.url_has_cyrillic = has_cyrillic;
        *entry
    }

    /// Record the latest page observation, keeping the URL flag
    pub fn set_page_flag(&mut self, tab_id: TabId, has_cyrillic: bool) -> TabStatus {
        let entry = self.entries.entry(tab_id).or_default();
        entry.page_has_cyrillic = has_cyrillic;
        *entry
    }

    /// Drop a closed tab's entry
    pub fn evict(&mut self, tab_id: TabId) -> Option<TabStatus> {
        self.entries.remove(&tab_id)
    }

    /// Number of tracked tabs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
