//! First-seen correlation table
//!
//! Maps a 32-bit discriminator (TSval or expected-next sequence number)
//! scoped to a flow onto the capture time it was first seen. Lookups in
//! the reverse direction consume the entry, so one sighting yields at
//! most one delay sample.

use std::collections::HashMap;

use crate::core::flow::FlowKey;

/// Composite correlation key: discriminator + flow endpoints.
///
/// A fixed-layout struct with a structural hash; building one never
/// allocates, unlike the string keys a naive rendition would use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrKey {
    pub disc: u32,
    pub flow: FlowKey,
}

impl CorrKey {
    pub fn new(disc: u32, flow: FlowKey) -> Self {
        Self { disc, flow }
    }
}

/// Table statistics
#[derive(Debug, Clone, Default)]
pub struct CorrStats {
    pub inserts: u64,
    /// try_insert calls that found the key already present
    pub kept_first: u64,
    pub hits: u64,
    pub misses: u64,
    pub evicted: u64,
}

/// First-writer-wins map from correlation key to capture time
pub struct CorrelationTable {
    entries: HashMap<CorrKey, f64>,
    pub stats: CorrStats,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CorrStats::default(),
        }
    }

    /// Record the capture time for `key` unless one is already stored.
    ///
    /// The same discriminator may appear on multiple packets; keeping the
    /// first (oldest) sighting may overestimate the delay but never
    /// underestimates it.
    pub fn try_insert(&mut self, key: CorrKey, tm: f64) {
        match self.entries.entry(key) {
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(tm);
                self.stats.inserts += 1;
            }
            std::collections::hash_map::Entry::Occupied(_) => {
                self.stats.kept_first += 1;
            }
        }
    }

    /// Remove and return the stored time for `key`.
    ///
    /// Removal (rather than peeking) guarantees a single sample per
    /// sighting: later packets echoing the same value find nothing.
    pub fn take(&mut self, key: &CorrKey) -> Option<f64> {
        match self.entries.remove(key) {
            Some(tm) => {
                self.stats.hits += 1;
                Some(tm)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Remove every entry stored more than `max_age` seconds before `now`
    pub fn evict_old(&mut self, now: f64, max_age: f64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, &mut tm| now - tm <= max_age);
        let removed = before - self.entries.len();
        self.stats.evicted += removed as u64;
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CorrelationTable {
    fn default() -> Self {
        Self::new()
    }
}
