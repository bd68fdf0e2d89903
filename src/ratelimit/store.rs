// Copyright 2024-2026 SafePlate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Rate-limit entry storage.
//!
//! The store is the only shared mutable state in the pipeline. It is an
//! explicitly owned object handed to the limiter, so a deployment can swap
//! the in-process map for a remote atomic-increment service without the
//! guard noticing.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Request count for one `(identifier, endpoint)` key in the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_reset_at: DateTime<Utc>,
}

impl RateLimitEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.window_reset_at
    }
}

/// Key to entry storage with a per-key atomic update.
pub trait RateLimitStore: Send + Sync {
    fn get(&self, key: &str) -> Option<RateLimitEntry>;

    fn set(&self, key: &str, entry: RateLimitEntry);

    /// Returns true if an entry was removed.
    fn delete(&self, key: &str) -> bool;

    /// Run a read-decide-write sequence on one key as a single critical
    /// section. `apply` sees the current entry and returns the entry to
    /// store, or `None` to leave the key untouched.
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<&RateLimitEntry>) -> Option<RateLimitEntry>,
    );

    /// Remove entries whose window closed before `now`. Returns the count.
    fn remove_expired(&self, now: DateTime<Utc>) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sharded in-process store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: DashMap<String, RateLimitEntry>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for InMemoryStore {
    fn get(&self, key: &str) -> Option<RateLimitEntry> {
        self.entries.get(key).map(|e| *e.value())
    }

    fn set(&self, key: &str, entry: RateLimitEntry) {
        self.entries.insert(key.to_string(), entry);
    }

    fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<&RateLimitEntry>) -> Option<RateLimitEntry>,
    ) {
        // The entry guard holds the shard write lock until it drops.
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if let Some(next) = apply(Some(occupied.get())) {
                    occupied.insert(next);
                }
            }
            Entry::Vacant(vacant) => {
                if let Some(next) = apply(None) {
                    vacant.insert(next);
                }
            }
        }
    }

    fn remove_expired(&self, now: DateTime<Utc>) -> usize {
        // Snapshot first so no shard lock is held across the whole sweep.
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.value().is_expired(now))
            .map(|e| e.key().clone())
            .collect();

        // Re-check under the key lock: a request may have refreshed it.
        expired
            .iter()
            .filter(|key| {
                self.entries
                    .remove_if(key.as_str(), |_, entry| entry.is_expired(now))
                    .is_some()
            })
            .count()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
