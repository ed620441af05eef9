//! A capacity-bounded TTL cache with an injectable clock.
//!
//! Built as an explicit object rather than a process-wide singleton so it
//! can be owned per consumer and driven by a fake clock in tests. Eviction
//! on overflow prefers entries that have already expired; if none have, the
//! oldest insertion goes.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Time source for cache expiry.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
    inserted: u64,
}

/// Bounded map from `K` to `V` where entries expire `ttl` after insertion.
#[derive(Debug)]
pub struct TtlCache<K, V, C = SystemClock> {
    entries: HashMap<K, Entry<V>>,
    ttl: Duration,
    capacity: usize,
    clock: C,
    tick: u64,
}

impl<K: Eq + Hash + Clone, V> TtlCache<K, V, SystemClock> {
    /// A cache holding at most `capacity` live entries.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self::with_clock(capacity, ttl, SystemClock)
    }
}

impl<K: Eq + Hash + Clone, V, C: Clock> TtlCache<K, V, C> {
    pub fn with_clock(capacity: usize, ttl: Duration, clock: C) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            capacity: capacity.max(1),
            clock,
            tick: 0,
        }
    }

    /// Fetch a live entry. Expired entries are dropped on access.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let now = self.clock.now();
        let expired = match self.entries.get(key) {
            Some(entry) => entry.expires_at <= now,
            None => return None,
        };
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Insert or replace an entry, evicting if the cache is full.
    pub fn insert(&mut self, key: K, value: V) {
        let now = self.clock.now();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_one(now);
        }
        self.tick += 1;
        self.entries.insert(
            key,
            Entry {
                value,
                expires_at: now + self.ttl,
                inserted: self.tick,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_one(&mut self, now: Instant) {
        let expired_key = self
            .entries
            .iter()
            .find(|(_, entry)| entry.expires_at <= now)
            .map(|(key, _)| key.clone());
        if let Some(key) = expired_key {
            self.entries.remove(&key);
            return;
        }

        let oldest_key = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.inserted)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest_key {
            self.entries.remove(&key);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
