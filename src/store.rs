// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

use std::time::{Duration, Instant};

use crate::{
    metapb::{self, StoreState},
    pdpb,
};

/// A store with no heartbeat inside this window counts as disconnected.
pub const STORE_DISCONNECT_DURATION: Duration = Duration::from_secs(20);

/// Everything the scheduling layer observes about one store: its metadata,
/// the load statistics from its latest heartbeat, and bookkeeping maintained
/// by the layers above (region counts, block flag).
#[derive(Clone, Debug)]
pub struct StoreInfo {
    pub store: metapb::Store,
    pub stats: pdpb::StoreStats,
    pub leader_count: usize,
    pub region_count: usize,
    pub pending_peer_count: usize,
    pub last_heartbeat: Option<Instant>,
    blocked: bool,
}

impl StoreInfo {
    pub fn new(store: metapb::Store) -> StoreInfo {
        StoreInfo {
            store,
            stats: pdpb::StoreStats::default(),
            leader_count: 0,
            region_count: 0,
            pending_peer_count: 0,
            last_heartbeat: None,
            blocked: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.store.id
    }

    pub fn labels(&self) -> &[metapb::StoreLabel] {
        &self.store.labels
    }

    /// The store's value for a label key, or `""` when unlabelled. Label
    /// keys are matched case-insensitively.
    pub fn get_label_value(&self, key: &str) -> &str {
        self.store
            .labels
            .iter()
            .find(|l| l.key.eq_ignore_ascii_case(key))
            .map_or("", |l| l.value.as_str())
    }

    /// Excludes the store from balance decisions until `unblock`.
    pub fn block(&mut self) {
        self.blocked = true;
    }

    pub fn unblock(&mut self) {
        self.blocked = false;
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn is_up(&self) -> bool {
        self.store.state == StoreState::Up
    }

    pub fn is_offline(&self) -> bool {
        self.store.state == StoreState::Offline
    }

    pub fn is_tombstone(&self) -> bool {
        self.store.state == StoreState::Tombstone
    }

    /// Wall-clock interval since the last heartbeat; a store that never
    /// reported is down forever.
    pub fn down_time(&self) -> Duration {
        self.last_heartbeat.map_or(Duration::MAX, |ts| ts.elapsed())
    }

    pub fn is_disconnected(&self) -> bool {
        self.down_time() > STORE_DISCONNECT_DURATION
    }

    pub fn storage_size(&self) -> u64 {
        self.stats.capacity.saturating_sub(self.stats.available)
    }

    pub fn available_ratio(&self) -> f64 {
        if self.stats.capacity == 0 {
            return 0.0;
        }
        self.stats.available as f64 / self.stats.capacity as f64
    }

    /// Whether remaining space has fallen under `1 - low_space_ratio` of
    /// capacity. A store that has not reported its capacity yet is not
    /// considered low.
    pub fn is_low_space(&self, low_space_ratio: f64) -> bool {
        if self.stats.capacity == 0 {
            return false;
        }
        self.available_ratio() < 1.0 - low_space_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metapb::StoreLabel;

    fn new_store(id: u64) -> StoreInfo {
        StoreInfo::new(metapb::Store {
            id,
            ..Default::default()
        })
    }

    #[test]
    fn test_state_predicates() {
        let mut store = new_store(1);
        assert!(store.is_up());
        assert!(!store.is_offline());
        assert!(!store.is_tombstone());

        store.store.state = StoreState::Offline;
        assert!(!store.is_up());
        assert!(store.is_offline());

        store.store.state = StoreState::Tombstone;
        assert!(store.is_tombstone());
    }

    #[test]
    fn test_block() {
        let mut store = new_store(1);
        assert!(!store.is_blocked());
        store.block();
        assert!(store.is_blocked());
        store.unblock();
        assert!(!store.is_blocked());
    }

    #[test]
    fn test_down_time() {
        let mut store = new_store(1);
        assert_eq!(store.down_time(), Duration::MAX);
        assert!(store.is_disconnected());

        store.last_heartbeat = Some(Instant::now());
        assert!(store.down_time() < Duration::from_secs(1));
        assert!(!store.is_disconnected());

        store.last_heartbeat = Instant::now().checked_sub(Duration::from_secs(21));
        assert!(store.is_disconnected());
    }

    #[test]
    fn test_low_space() {
        let mut store = new_store(1);
        // Unknown capacity is never low.
        assert!(!store.is_low_space(0.8));

        store.stats.capacity = 100;
        store.stats.available = 50;
        assert!(!store.is_low_space(0.8));
        assert_eq!(store.storage_size(), 50);

        store.stats.available = 19;
        assert!(store.is_low_space(0.8));
        assert!(!store.is_low_space(0.9));
    }

    #[test]
    fn test_label_value() {
        let mut store = new_store(1);
        store.store.labels = vec![
            StoreLabel::new("zone", "z1"),
            StoreLabel::new("Host", "h1"),
        ];
        assert_eq!(store.get_label_value("zone"), "z1");
        assert_eq!(store.get_label_value("ZONE"), "z1");
        assert_eq!(store.get_label_value("host"), "h1");
        assert_eq!(store.get_label_value("rack"), "");
    }
}
