// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

/// A TTL set of store ids. Entries expire `ttl` after insertion; expired
/// entries are swept on writes and ignored by reads. The map lives behind
/// its own mutex so many filter evaluations may consult it concurrently.
pub struct TtlCache {
    ttl: Duration,
    items: Mutex<HashMap<u64, Instant>>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> TtlCache {
        TtlCache {
            ttl,
            items: Mutex::new(HashMap::new()),
        }
    }

    pub fn put(&self, id: u64) {
        let mut items = self.items.lock().unwrap();
        let now = Instant::now();
        items.retain(|_, deadline| *deadline > now);
        items.insert(id, now + self.ttl);
    }

    pub fn exists(&self, id: u64) -> bool {
        self.items
            .lock()
            .unwrap()
            .get(&id)
            .map_or(false, |deadline| *deadline > Instant::now())
    }

    pub fn remove(&self, id: u64) {
        self.items.lock().unwrap().remove(&id);
    }

    /// Count of unexpired entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.items
            .lock()
            .unwrap()
            .values()
            .filter(|deadline| **deadline > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
