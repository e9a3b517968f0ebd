// SPDX-FileCopyrightText: 2026 Taskbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Advisory single-flight lock keyed by `(ticket, action)`.
//!
//! The lock lives in process memory only. It deduplicates near-simultaneous
//! events on the same ticket (a double click, two PMs reacting at once) and
//! gives no guarantee across restarts or bot instances. Entries older than
//! the TTL are stale and are purged on every access; the map never grows
//! past its capacity.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use taskbridge_core::{TaskbridgeError, TicketKey};
use tokio::time::Instant;
use tracing::{debug, warn};

type Entry = (TicketKey, &'static str);

#[derive(Debug, Default)]
struct Entries {
    held: HashMap<Entry, Instant>,
}

/// In-memory processing lock.
#[derive(Debug, Clone)]
pub struct ProcessingLock {
    entries: Arc<Mutex<Entries>>,
    ttl: Duration,
    capacity: usize,
}

impl ProcessingLock {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Entries::default())),
            ttl,
            capacity: capacity.max(1),
        }
    }

    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Acquires `(key, action)`, or fails with [`TaskbridgeError::Busy`] when a
    /// fresh entry already holds it. The entry is released when the returned
    /// guard drops.
    pub fn try_acquire(&self, key: &TicketKey, action: &'static str) -> Result<LockGuard, TaskbridgeError> {
        let now = Instant::now();
        let mut entries = self.entries();
        purge(&mut entries, now, self.ttl);

        let entry = (key.clone(), action);
        if entries.held.contains_key(&entry) {
            debug!(ticket = %key, action, "processing lock busy");
            return Err(TaskbridgeError::Busy {
                key: key.to_string(),
                action: action.to_string(),
            });
        }

        if entries.held.len() >= self.capacity
            && let Some(oldest) = entries
                .held
                .iter()
                .min_by_key(|(_, at)| **at)
                .map(|(e, _)| e.clone())
        {
            warn!(ticket = %oldest.0, action = oldest.1, "processing lock full, evicting oldest entry");
            entries.held.remove(&oldest);
        }

        entries.held.insert(entry.clone(), now);
        Ok(LockGuard {
            entries: Arc::clone(&self.entries),
            entry,
            acquired_at: now,
        })
    }

    /// True while a fresh entry holds `(key, action)`.
    pub fn is_held(&self, key: &TicketKey, action: &'static str) -> bool {
        let mut entries = self.entries();
        purge(&mut entries, Instant::now(), self.ttl);
        entries.held.contains_key(&(key.clone(), action))
    }

    /// Number of fresh entries.
    pub fn len(&self) -> usize {
        let mut entries = self.entries();
        purge(&mut entries, Instant::now(), self.ttl);
        entries.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn purge(entries: &mut Entries, now: Instant, ttl: Duration) {
    let before = entries.held.len();
    entries.held.retain(|_, at| now.duration_since(*at) < ttl);
    let purged = before - entries.held.len();
    if purged > 0 {
        debug!(purged, "expired processing lock entries");
    }
}

/// Releases its lock entry on drop.
///
/// A guard whose entry already expired and was re-acquired by someone else
/// leaves the newer entry alone.
#[derive(Debug)]
pub struct LockGuard {
    entries: Arc<Mutex<Entries>>,
    entry: Entry,
    acquired_at: Instant,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if entries.held.get(&self.entry) == Some(&self.acquired_at) {
            entries.held.remove(&self.entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> TicketKey {
        TicketKey::parse(s).unwrap()
    }

    #[test]
    fn second_acquire_is_busy_until_release() {
        let lock = ProcessingLock::new(Duration::from_secs(30), 16);
        let guard = lock.try_acquire(&key("KAN-1"), "approve").unwrap();

        let err = lock.try_acquire(&key("KAN-1"), "approve").unwrap_err();
        assert!(matches!(err, TaskbridgeError::Busy { .. }));
        assert_eq!(err.to_string(), "KAN-1 is already being processed (approve)");

        drop(guard);
        assert!(lock.try_acquire(&key("KAN-1"), "approve").is_ok());
    }

    #[test]
    fn actions_and_tickets_are_independent() {
        let lock = ProcessingLock::new(Duration::from_secs(30), 16);
        let _a = lock.try_acquire(&key("KAN-1"), "approve").unwrap();
        let _b = lock.try_acquire(&key("KAN-1"), "deny").unwrap();
        let _c = lock.try_acquire(&key("KAN-2"), "approve").unwrap();
        assert_eq!(lock.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entries_expire() {
        let lock = ProcessingLock::new(Duration::from_secs(30), 16);
        let stale = lock.try_acquire(&key("KAN-1"), "claim").unwrap();

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(!lock.is_held(&key("KAN-1"), "claim"));

        let fresh = lock.try_acquire(&key("KAN-1"), "claim").unwrap();
        drop(stale);
        assert!(lock.is_held(&key("KAN-1"), "claim"), "stale guard must not release the fresh entry");
        drop(fresh);
        assert!(lock.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn capacity_evicts_oldest() {
        let lock = ProcessingLock::new(Duration::from_secs(30), 2);
        let _a = lock.try_acquire(&key("A-1"), "claim").unwrap();
        tokio::time::advance(Duration::from_millis(10)).await;
        let _b = lock.try_acquire(&key("A-2"), "claim").unwrap();
        tokio::time::advance(Duration::from_millis(10)).await;
        let _c = lock.try_acquire(&key("A-3"), "claim").unwrap();

        assert_eq!(lock.len(), 2);
        assert!(!lock.is_held(&key("A-1"), "claim"));
        assert!(lock.is_held(&key("A-3"), "claim"));
    }
}
