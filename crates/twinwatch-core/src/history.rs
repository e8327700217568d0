//! Time-ordered, capacity-bounded message history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Retained readings, ordered by timestamp.
///
/// New readings almost always arrive newest-first, so insertion scans from
/// the tail and is O(1) amortized; an out-of-order reading walks back to its
/// timestamp position. Readings are owned by value so the history can be
/// truncated independently of anything else holding them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History<T> {
    entries: Vec<T>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> History<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    /// Insert keeping timestamp order, scanning back from the tail.
    ///
    /// Equal timestamps keep arrival order.
    pub fn insert_ordered<F>(&mut self, item: T, timestamp: F)
    where
        F: Fn(&T) -> DateTime<Utc>,
    {
        let ts = timestamp(&item);
        let mut pos = self.entries.len();
        while pos > 0 && ts < timestamp(&self.entries[pos - 1]) {
            pos -= 1;
        }
        self.entries.insert(pos, item);
    }

    /// Drop the `n` oldest entries from the front
    pub fn drop_oldest(&mut self, n: usize) {
        let n = n.min(self.entries.len());
        self.entries.drain(..n);
    }
}

/// Capacity bound on retained history.
///
/// The processor samples `at_capacity` before a batch and trims after the
/// aggregates are computed, so one batch can briefly push the history past
/// the bound before the oldest entries drop.
#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    pub max_entries: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { max_entries: 2000 }
    }
}

impl RetentionPolicy {
    pub fn at_capacity(&self, len: usize) -> bool {
        len >= self.max_entries
    }

    /// How many oldest entries to drop on overflow: a 1000-entry slab, or
    /// 100 when the configured bound is too small to spare that much.
    pub fn trim_count(&self) -> usize {
        if self.max_entries > 1000 {
            1000
        } else {
            100
        }
    }
}
