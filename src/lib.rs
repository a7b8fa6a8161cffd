// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

//! The in-memory decision core of a placement driver for a region-sharded
//! key-value cluster.
//!
//! Two halves:
//!
//! - [`RegionCollection`] is the authoritative index of every region built
//!   from heartbeats: id lookup, key lookup through a range tree, per-store
//!   slicing into leader/follower/learner/pending buckets, O(1) uniform
//!   random sampling, and aggregate statistics. Writes replace whole region
//!   snapshots; queries hand out deep clones.
//! - [`Filter`] implementations are the store-eligibility predicates the
//!   scheduling layer runs over every store when picking replica or
//!   leadership donors and receivers. Each rejection is tagged and counted.
//!
//! The collection expects a single writer; wrap it in a `RwLock` and take
//! the shared side for queries. Nothing here performs I/O or blocks.

pub mod cache;
pub mod collection;
pub mod config;
pub mod filter;
pub mod metapb;
pub mod metrics;
pub mod namespace;
pub mod pdpb;
pub mod region;
pub mod replica;
pub mod store;

mod logging;
mod region_map;
mod region_tree;

pub use self::{
    cache::TtlCache,
    collection::{RegionCollection, RegionStats, RANDOM_REGION_MAX_RETRY},
    config::{Config, ConfigError, LabelProperty, Options, ReadableDuration, REJECT_LEADER},
    filter::{filter_source, filter_target, Filter},
    namespace::{Classifier, DefaultClassifier, DEFAULT_NAMESPACE},
    region::{
        diff_region_keys, diff_region_peers, health_region, RegionInfo, RegionOption,
        EMPTY_REGION_APPROXIMATE_SIZE,
    },
    replica::distinct_score,
    store::{StoreInfo, STORE_DISCONNECT_DURATION},
};
