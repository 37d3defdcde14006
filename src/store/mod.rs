//! In-memory scan history.
//!
//! Ordered most-recent-first. Mutated only by `add` (prepend) and
//! `remove` (by id); entries are shared immutably and never edited.
//! Nothing is persisted: history starts from the seeded examples and
//! lives as long as the process.

pub mod seed;

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use log::{info, warn};

use crate::scan::result::ScanResult;

#[derive(Debug, Default)]
pub struct HistoryStore {
    entries: VecDeque<Arc<ScanResult>>,
    ids: HashSet<String>,
}

impl HistoryStore {
    pub fn new() -> Self {
        HistoryStore::default()
    }

    /// History holding the bundled example scans.
    pub fn seeded() -> Self {
        let mut store = HistoryStore::new();
        // seed list is newest-first, prepend oldest first to keep that order
        for entry in seed::examples().into_iter().rev() {
            store.add(Arc::new(entry));
        }
        store
    }

    /// Prepend a result in O(1) amortized. An entry already holding the
    /// same id is replaced so ids stay unique; only that case scans.
    pub fn add(&mut self, result: Arc<ScanResult>) {
        if !self.ids.insert(result.id.clone()) {
            warn!("history already holds {}, replacing it", result.id);
            if let Some(pos) = self.position(&result.id) {
                self.entries.remove(pos);
            }
        }
        info!("history: added {}", result.id);
        self.entries.push_front(result);
    }

    /// Remove the entry with `id`. Missing ids are ignored.
    pub fn remove(&mut self, id: &str) -> Option<Arc<ScanResult>> {
        if !self.ids.remove(id) {
            return None;
        }
        let pos = self.position(id)?;
        let removed = self.entries.remove(pos);
        if removed.is_some() {
            info!("history: removed {id}");
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&Arc<ScanResult>> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Entries, most recent first.
    pub fn list(&self) -> impl ExactSizeIterator<Item = &Arc<ScanResult>> + '_ {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<Arc<ScanResult>> {
        self.entries.iter().cloned().collect()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }
}
