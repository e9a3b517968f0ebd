// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Short-lived memory of where a ticket's thread was last seen.
//!
//! A hint lets the resolver answer repeat lookups within one workflow burst
//! without touching Discord. Hints expire quickly and are dropped whenever a
//! lifecycle mutation touches their thread; losing them costs a search, never
//! correctness.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use taskbridge_core::types::{Forum, Thread};
use taskbridge_core::{ChannelId, TicketKey};
use tokio::time::Instant;
use tracing::debug;

/// Hints kept at most; the oldest is evicted beyond this.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Last known location of a ticket's thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadHint {
    pub forum: Forum,
    pub thread: Thread,
}

#[derive(Debug)]
pub struct ThreadHints {
    entries: Mutex<HashMap<TicketKey, (ThreadHint, Instant)>>,
    ttl: Duration,
    capacity: usize,
}

impl ThreadHints {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<TicketKey, (ThreadHint, Instant)>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fresh hint for `key`, if any. Expired hints are dropped here.
    pub fn get(&self, key: &TicketKey) -> Option<ThreadHint> {
        let mut entries = self.entries();
        match entries.get(key) {
            Some((hint, at)) if at.elapsed() < self.ttl => Some(hint.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Records where `key` lives. Expired hints for every ticket are purged
    /// first, and the oldest hint is evicted when the cache is full.
    pub fn remember(&self, key: &TicketKey, forum: &Forum, thread: &Thread) {
        let hint = ThreadHint {
            forum: forum.clone(),
            thread: thread.clone(),
        };
        let now = Instant::now();
        let mut entries = self.entries();

        let before = entries.len();
        entries.retain(|_, (_, at)| now.duration_since(*at) < self.ttl);
        let purged = before - entries.len();
        if purged > 0 {
            debug!(purged, "expired thread hints");
        }

        if !entries.contains_key(key)
            && entries.len() >= self.capacity
            && let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, (_, at))| *at)
                .map(|(k, _)| k.clone())
        {
            entries.remove(&oldest);
        }

        entries.insert(key.clone(), (hint, now));
    }

    pub fn invalidate(&self, key: &TicketKey) {
        self.entries().remove(key);
    }

    /// Drops every hint pointing at `thread`.
    pub fn invalidate_thread(&self, thread: ChannelId) {
        self.entries().retain(|_, (hint, _)| hint.thread.id != thread);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
