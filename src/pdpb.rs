// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

//! Control-plane messages reported by stores: per-store load statistics and
//! the region heartbeat payload the index is fed from.

use crate::metapb;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PeerStats {
    pub peer: metapb::Peer,
    pub down_seconds: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub store_id: u64,
    /// Total disk capacity in bytes.
    pub capacity: u64,
    /// Remaining disk space in bytes.
    pub available: u64,
    pub region_count: u32,
    pub sending_snap_count: u32,
    pub receiving_snap_count: u32,
    pub applying_snap_count: u32,
    pub is_busy: bool,
    pub used_size: u64,
    pub bytes_written: u64,
    pub keys_written: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegionHeartbeatRequest {
    pub region: metapb::Region,
    pub leader: Option<metapb::Peer>,
    pub down_peers: Vec<PeerStats>,
    pub pending_peers: Vec<metapb::Peer>,
    pub bytes_written: u64,
    pub bytes_read: u64,
    /// Approximate data size in bytes.
    pub approximate_size: u64,
    pub approximate_keys: u64,
}
