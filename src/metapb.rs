// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

//! Cluster metadata messages shared with the data plane.
//!
//! These mirror the wire-level protobuf messages; the decision core itself
//! has no RPC surface, so they are plain structs. `Clone` is a deep copy.

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionEpoch {
    /// Bumped on membership (conf change) updates.
    pub conf_ver: u64,
    /// Bumped on split and merge updates.
    pub version: u64,
}

impl RegionEpoch {
    pub fn new(conf_ver: u64, version: u64) -> RegionEpoch {
        RegionEpoch { conf_ver, version }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Peer {
    pub id: u64,
    pub store_id: u64,
    pub is_learner: bool,
}

impl Peer {
    pub fn new(id: u64, store_id: u64) -> Peer {
        Peer {
            id,
            store_id,
            is_learner: false,
        }
    }
}

/// One contiguous half-open key range `[start_key, end_key)`.
///
/// An empty `start_key` stands for the lowest possible key and an empty
/// `end_key` for a key greater than every other key, so a region with both
/// keys empty covers the whole key space.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Region {
    pub id: u64,
    pub start_key: Vec<u8>,
    pub end_key: Vec<u8>,
    pub region_epoch: RegionEpoch,
    pub peers: Vec<Peer>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreState {
    #[default]
    Up,
    Offline,
    Tombstone,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreLabel {
    pub key: String,
    pub value: String,
}

impl StoreLabel {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> StoreLabel {
        StoreLabel {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Store {
    pub id: u64,
    pub address: String,
    pub state: StoreState,
    pub labels: Vec<StoreLabel>,
}
