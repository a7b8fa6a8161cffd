// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

use std::{
    collections::{HashMap, HashSet},
    ops::Deref,
};

use crate::{metapb, pdpb};

/// Approximate size credited to a region whose reported data fits in one
/// megabyte. Regions at this floor count as empty in statistics.
pub const EMPTY_REGION_APPROXIMATE_SIZE: i64 = 1;

/// Predicate used to narrow random region sampling.
pub type RegionOption = fn(&RegionInfo) -> bool;

/// A region is healthy when nothing about its replication is in flight: no
/// down peers, no pending peers, no learners.
pub fn health_region(region: &RegionInfo) -> bool {
    region.down_peers.is_empty() && region.pending_peers.is_empty() && region.learners.is_empty()
}

/// The snapshot of one region built from its latest heartbeat.
///
/// Every heartbeat produces a fresh `RegionInfo`; the index replaces whole
/// snapshots and never mutates one in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionInfo {
    pub region: metapb::Region,
    pub leader: Option<metapb::Peer>,
    pub voters: Vec<metapb::Peer>,
    pub learners: Vec<metapb::Peer>,
    pub down_peers: Vec<pdpb::PeerStats>,
    pub pending_peers: Vec<metapb::Peer>,
    pub written_bytes: u64,
    pub read_bytes: u64,
    /// Approximate data size in MB, floored to `EMPTY_REGION_APPROXIMATE_SIZE`.
    pub approximate_size: i64,
    pub approximate_keys: i64,
}

impl Deref for RegionInfo {
    type Target = metapb::Region;

    fn deref(&self) -> &Self::Target {
        &self.region
    }
}

impl RegionInfo {
    pub fn new(region: metapb::Region, leader: Option<metapb::Peer>) -> RegionInfo {
        let mut info = RegionInfo {
            region,
            leader,
            ..Default::default()
        };
        info.classify_peers();
        info
    }

    /// Builds the snapshot a heartbeat describes. The reported size is in
    /// bytes; it is stored in MB and floored so that empty regions still
    /// carry weight in balance decisions.
    pub fn from_heartbeat(heartbeat: &pdpb::RegionHeartbeatRequest) -> RegionInfo {
        let mut size = (heartbeat.approximate_size / (1 << 20)) as i64;
        if size < EMPTY_REGION_APPROXIMATE_SIZE {
            size = EMPTY_REGION_APPROXIMATE_SIZE;
        }

        let mut info = RegionInfo {
            region: heartbeat.region.clone(),
            leader: heartbeat.leader.clone(),
            down_peers: heartbeat.down_peers.clone(),
            pending_peers: heartbeat.pending_peers.clone(),
            written_bytes: heartbeat.bytes_written,
            read_bytes: heartbeat.bytes_read,
            approximate_size: size,
            approximate_keys: heartbeat.approximate_keys as i64,
            ..Default::default()
        };
        info.classify_peers();
        info
    }

    /// Partitions `peers` into the voter and learner slices. Must be called
    /// again whenever the peer list changes.
    fn classify_peers(&mut self) {
        self.voters = self
            .region
            .peers
            .iter()
            .filter(|p| !p.is_learner)
            .cloned()
            .collect();
        self.learners = self
            .region
            .peers
            .iter()
            .filter(|p| p.is_learner)
            .cloned()
            .collect();
    }

    pub fn get_peer(&self, peer_id: u64) -> Option<&metapb::Peer> {
        self.region.peers.iter().find(|p| p.id == peer_id)
    }

    pub fn get_down_peer(&self, peer_id: u64) -> Option<&metapb::Peer> {
        self.down_peers
            .iter()
            .map(|stats| &stats.peer)
            .find(|p| p.id == peer_id)
    }

    pub fn get_pending_peer(&self, peer_id: u64) -> Option<&metapb::Peer> {
        self.pending_peers.iter().find(|p| p.id == peer_id)
    }

    pub fn get_store_peer(&self, store_id: u64) -> Option<&metapb::Peer> {
        self.region.peers.iter().find(|p| p.store_id == store_id)
    }

    pub fn get_store_voter(&self, store_id: u64) -> Option<&metapb::Peer> {
        self.voters.iter().find(|p| p.store_id == store_id)
    }

    pub fn get_store_learner(&self, store_id: u64) -> Option<&metapb::Peer> {
        self.learners.iter().find(|p| p.store_id == store_id)
    }

    /// Ids of all stores hosting a peer of this region.
    pub fn get_store_ids(&self) -> HashSet<u64> {
        self.region.peers.iter().map(|p| p.store_id).collect()
    }

    /// Voters that are not the leader, keyed by their store.
    pub fn get_followers(&self) -> HashMap<u64, &metapb::Peer> {
        self.voters
            .iter()
            .filter(|p| self.leader.as_ref().map_or(true, |l| l.id != p.id))
            .map(|p| (p.store_id, p))
            .collect()
    }

    /// Any voter that is not the leader.
    pub fn get_follower(&self) -> Option<&metapb::Peer> {
        self.voters
            .iter()
            .find(|p| self.leader.as_ref().map_or(true, |l| l.id != p.id))
    }

    /// Followers located on stores where `other` has no follower.
    pub fn get_diff_followers(&self, other: &RegionInfo) -> Vec<&metapb::Peer> {
        let theirs = other.get_followers();
        self.get_followers()
            .into_values()
            .filter(|p| !theirs.contains_key(&p.store_id))
            .collect()
    }

    /// Test support: appends a peer and re-classifies.
    pub fn add_peer(&mut self, peer: metapb::Peer) {
        self.region.peers.push(peer);
        self.classify_peers();
    }

    /// Test support: drops the peer on `store_id` and re-classifies.
    pub fn remove_store_peer(&mut self, store_id: u64) {
        self.region.peers.retain(|p| p.store_id != store_id);
        self.classify_peers();
    }
}

/// Renders the peer-membership difference between two snapshots of the same
/// region: `Remove peer:{..}` and `Add peer:{..}` entries joined by `,`.
pub fn diff_region_peers(origin: &RegionInfo, other: &RegionInfo) -> String {
    let mut ret = Vec::new();
    for a in &origin.region.peers {
        if !other.region.peers.contains(a) {
            ret.push(format!("Remove peer:{{{:?}}}", a));
        }
    }
    for b in &other.region.peers {
        if !origin.region.peers.contains(b) {
            ret.push(format!("Add peer:{{{:?}}}", b));
        }
    }
    ret.join(",")
}

/// Renders start/end key transitions between two snapshots of the same
/// region, keys in hex.
pub fn diff_region_keys(origin: &RegionInfo, other: &RegionInfo) -> String {
    let mut ret = Vec::new();
    if origin.region.start_key != other.region.start_key {
        ret.push(format!(
            "StartKey Changed:{{{}}} -> {{{}}}",
            hex::encode_upper(&origin.region.start_key),
            hex::encode_upper(&other.region.start_key)
        ));
    }
    if origin.region.end_key != other.region.end_key {
        ret.push(format!(
            "EndKey Changed:{{{}}} -> {{{}}}",
            hex::encode_upper(&origin.region.end_key),
            hex::encode_upper(&other.region.end_key)
        ));
    }
    ret.join(",")
}
