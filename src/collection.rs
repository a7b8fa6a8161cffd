// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

use std::{collections::HashMap, sync::Arc};

use crate::logging::debug;

use crate::{
    metapb,
    region::{RegionInfo, RegionOption, EMPTY_REGION_APPROXIMATE_SIZE},
    region_map::RegionMap,
    region_tree::{RangeKey, RegionTree},
};

/// How many draws a predicate-narrowed random sample may take before giving
/// up.
pub const RANDOM_REGION_MAX_RETRY: usize = 10;

/// The authoritative index of every region and its distribution across
/// stores: one range tree for key lookups, one global map for id lookups,
/// and per-store buckets slicing regions into leaders, followers, learners
/// and pending peers.
///
/// Mutations must come from a single writer; queries may run concurrently
/// under a shared lock held by the caller. Query results are deep clones, so
/// holders cannot reach back into the index.
#[derive(Default)]
pub struct RegionCollection {
    tree: RegionTree,
    regions: RegionMap,
    leaders: HashMap<u64, RegionMap>,
    followers: HashMap<u64, RegionMap>,
    learners: HashMap<u64, RegionMap>,
    pending_peers: HashMap<u64, RegionMap>,
}

impl RegionCollection {
    pub fn new() -> RegionCollection {
        RegionCollection::default()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Tree entry count. Always equals `len()`; exposed so tests can probe
    /// the invariant.
    pub fn tree_len(&self) -> usize {
        self.tree.len()
    }

    pub fn get_region(&self, region_id: u64) -> Option<RegionInfo> {
        self.regions.get(region_id).map(|r| RegionInfo::clone(r))
    }

    /// Replaces whatever the index knows about this region id, then inserts
    /// the new snapshot. Returns the metadata of regions the newcomer's key
    /// range displaced.
    pub fn set_region(&mut self, region: RegionInfo) -> Vec<metapb::Region> {
        if let Some(origin) = self.get_region(region.id) {
            self.remove_region(&origin);
        }
        self.add_region(region)
    }

    /// Inserts a snapshot the index has no entry for. Regions whose key
    /// ranges the newcomer overlaps are dissolved and returned.
    pub fn add_region(&mut self, region: RegionInfo) -> Vec<metapb::Region> {
        let region = Arc::new(region);

        let overlaps = self.tree.update(region.region.clone());
        for meta in &overlaps {
            if let Some(old) = self.get_region(meta.id) {
                debug!(
                    "region dissolved by overlapping update";
                    "region_id" => old.id,
                    "new_region_id" => region.id,
                );
                self.remove_region(&old);
            }
        }

        self.regions.put(region.clone());

        if let Some(leader) = region.leader.clone() {
            for peer in &region.voters {
                let buckets = if peer.id == leader.id {
                    &mut self.leaders
                } else {
                    &mut self.followers
                };
                buckets
                    .entry(peer.store_id)
                    .or_default()
                    .put(region.clone());
            }
        }
        for peer in &region.learners {
            self.learners
                .entry(peer.store_id)
                .or_default()
                .put(region.clone());
        }
        for peer in &region.pending_peers {
            self.pending_peers
                .entry(peer.store_id)
                .or_default()
                .put(region.clone());
        }

        overlaps
    }

    /// Tears a region out of the tree, the global map, and every per-store
    /// bucket any of its peers may occupy. Absent entries are no-ops.
    pub fn remove_region(&mut self, region: &RegionInfo) {
        self.tree.remove(&region.region);
        self.regions.delete(region.id);

        for peer in &region.region.peers {
            if let Some(m) = self.leaders.get_mut(&peer.store_id) {
                m.delete(region.id);
            }
            if let Some(m) = self.followers.get_mut(&peer.store_id) {
                m.delete(region.id);
            }
            if let Some(m) = self.learners.get_mut(&peer.store_id) {
                m.delete(region.id);
            }
            if let Some(m) = self.pending_peers.get_mut(&peer.store_id) {
                m.delete(region.id);
            }
        }
    }

    pub fn search_region(&self, key: &[u8]) -> Option<RegionInfo> {
        let meta = self.tree.search(key)?;
        self.get_region(meta.id)
    }

    /// All resident snapshots, cloned.
    pub fn get_regions(&self) -> Vec<RegionInfo> {
        self.regions.iter().map(|r| RegionInfo::clone(r)).collect()
    }

    /// Metadata of all resident regions, cloned.
    pub fn get_meta_regions(&self) -> Vec<metapb::Region> {
        self.regions.iter().map(|r| r.region.clone()).collect()
    }

    pub fn get_average_region_size(&self) -> i64 {
        if self.regions.is_empty() {
            return 0;
        }
        self.regions.total_size() / self.regions.len() as i64
    }

    pub fn total_size(&self) -> i64 {
        self.regions.total_size()
    }

    pub fn total_keys(&self) -> i64 {
        self.regions.total_keys()
    }

    pub fn get_store_leader_count(&self, store_id: u64) -> usize {
        self.leaders.get(&store_id).map_or(0, RegionMap::len)
    }

    pub fn get_store_follower_count(&self, store_id: u64) -> usize {
        self.followers.get(&store_id).map_or(0, RegionMap::len)
    }

    pub fn get_store_learner_count(&self, store_id: u64) -> usize {
        self.learners.get(&store_id).map_or(0, RegionMap::len)
    }

    pub fn get_store_pending_peer_count(&self, store_id: u64) -> usize {
        self.pending_peers.get(&store_id).map_or(0, RegionMap::len)
    }

    pub fn get_store_region_count(&self, store_id: u64) -> usize {
        self.get_store_leader_count(store_id)
            + self.get_store_follower_count(store_id)
            + self.get_store_learner_count(store_id)
    }

    pub fn get_store_leader_region_size(&self, store_id: u64) -> i64 {
        self.leaders.get(&store_id).map_or(0, RegionMap::total_size)
    }

    pub fn get_store_follower_region_size(&self, store_id: u64) -> i64 {
        self.followers
            .get(&store_id)
            .map_or(0, RegionMap::total_size)
    }

    pub fn get_store_learner_region_size(&self, store_id: u64) -> i64 {
        self.learners
            .get(&store_id)
            .map_or(0, RegionMap::total_size)
    }

    pub fn get_store_region_size(&self, store_id: u64) -> i64 {
        self.get_store_leader_region_size(store_id)
            + self.get_store_follower_region_size(store_id)
            + self.get_store_learner_region_size(store_id)
    }

    /// Test accessor: the region only if `store_id` leads it.
    pub fn get_leader(&self, store_id: u64, region_id: u64) -> Option<RegionInfo> {
        self.leaders
            .get(&store_id)
            .and_then(|m| m.get(region_id))
            .map(|r| RegionInfo::clone(r))
    }

    /// Test accessor: the region only if `store_id` follows it.
    pub fn get_follower(&self, store_id: u64, region_id: u64) -> Option<RegionInfo> {
        self.followers
            .get(&store_id)
            .and_then(|m| m.get(region_id))
            .map(|r| RegionInfo::clone(r))
    }

    /// Clones regions in ascending key order starting from the first region
    /// at or after `start_key`, stopping once `limit` snapshots are
    /// collected.
    pub fn scan_range(&self, start_key: &[u8], limit: usize) -> Vec<RegionInfo> {
        let mut regions = Vec::with_capacity(limit);
        self.tree.scan_range(start_key, |meta| {
            if let Some(region) = self.get_region(meta.id) {
                regions.push(region);
            }
            regions.len() < limit
        });
        regions
    }

    /// The tree neighbours of `region`, suppressed unless they are exactly
    /// key-contiguous with it, so a caller never sees a neighbour across a
    /// range gap.
    pub fn get_adjacent_regions(
        &self,
        region: &RegionInfo,
    ) -> (Option<RegionInfo>, Option<RegionInfo>) {
        let (prev_meta, next_meta) = self.tree.adjacent(&region.region);
        let mut prev = None;
        let mut next = None;
        if let Some(p) = prev_meta {
            if p.end_key == region.region.start_key {
                prev = self.get_region(p.id);
            }
        }
        if let Some(n) = next_meta {
            if region.region.end_key == n.start_key {
                next = self.get_region(n.id);
            }
        }
        (prev, next)
    }

    fn rand_from(map: Option<&RegionMap>, opts: &[RegionOption]) -> Option<RegionInfo> {
        let map = map?;
        for _ in 0..RANDOM_REGION_MAX_RETRY {
            let region = map.random_region()?;
            if opts.iter().all(|opt| opt(region)) {
                return Some(RegionInfo::clone(region));
            }
        }
        None
    }

    pub fn rand_region(&self, opts: &[RegionOption]) -> Option<RegionInfo> {
        Self::rand_from(Some(&self.regions), opts)
    }

    pub fn rand_leader_region(&self, store_id: u64, opts: &[RegionOption]) -> Option<RegionInfo> {
        Self::rand_from(self.leaders.get(&store_id), opts)
    }

    pub fn rand_follower_region(&self, store_id: u64, opts: &[RegionOption]) -> Option<RegionInfo> {
        Self::rand_from(self.followers.get(&store_id), opts)
    }

    /// Sums statistics over resident regions inside `[start_key, end_key)`.
    /// An empty `end_key` is unbounded on the upper side only.
    pub fn get_region_stats(&self, start_key: &[u8], end_key: &[u8]) -> RegionStats {
        let mut stats = RegionStats::default();
        self.tree.scan_range(start_key, |meta| {
            if !end_key.is_empty()
                && RangeKey::from_end_key(meta.end_key.clone())
                    >= RangeKey::from_start_key(end_key.to_vec())
            {
                return false;
            }
            if let Some(region) = self.regions.get(meta.id) {
                stats.observe(region);
            }
            true
        });
        stats
    }
}

/// Aggregate statistics and distribution of a set of regions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionStats {
    pub count: usize,
    /// Regions at the approximate-size floor.
    pub empty_count: usize,
    pub storage_size: i64,
    pub storage_keys: i64,
    pub store_leader_count: HashMap<u64, usize>,
    pub store_peer_count: HashMap<u64, usize>,
    pub store_leader_size: HashMap<u64, i64>,
    pub store_leader_keys: HashMap<u64, i64>,
    pub store_peer_size: HashMap<u64, i64>,
    pub store_peer_keys: HashMap<u64, i64>,
}

impl RegionStats {
    /// Folds one region in: whole-region figures are credited to the
    /// leader's store, and every peer's store receives one peer unit.
    pub fn observe(&mut self, region: &RegionInfo) {
        self.count += 1;
        if region.approximate_size <= EMPTY_REGION_APPROXIMATE_SIZE {
            self.empty_count += 1;
        }
        self.storage_size += region.approximate_size;
        self.storage_keys += region.approximate_keys;

        if let Some(leader) = &region.leader {
            *self.store_leader_count.entry(leader.store_id).or_default() += 1;
            *self.store_leader_size.entry(leader.store_id).or_default() +=
                region.approximate_size;
            *self.store_leader_keys.entry(leader.store_id).or_default() +=
                region.approximate_keys;
        }
        for peer in &region.region.peers {
            *self.store_peer_count.entry(peer.store_id).or_default() += 1;
            *self.store_peer_size.entry(peer.store_id).or_default() += region.approximate_size;
            *self.store_peer_keys.entry(peer.store_id).or_default() += region.approximate_keys;
        }
    }
}
