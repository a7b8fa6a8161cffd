// Copyright 2024 TiKV Project Authors. Licensed under Apache-2.0.

use std::{collections::HashSet, sync::Arc};

use crate::logging::debug;

use crate::{
    cache::TtlCache,
    config::{Options, REJECT_LEADER},
    metrics::FILTER_COUNTER_VEC,
    namespace::Classifier,
    replica::distinct_score,
    store::StoreInfo,
};

/// A store-eligibility predicate. `true` means the store must not be used in
/// that direction. Filters carry no mutable state; evaluating one is cheap
/// enough to run on every store per scheduling tick.
pub trait Filter: Send + Sync {
    /// Tag recorded with each rejection, for telemetry only.
    fn filter_type(&self) -> &'static str;
    /// Whether the store should not donate a replica or leadership.
    fn filter_source(&self, opt: &dyn Options, store: &StoreInfo) -> bool;
    /// Whether the store should not receive a replica or leadership.
    fn filter_target(&self, opt: &dyn Options, store: &StoreInfo) -> bool;
}

/// Whether any filter rejects the store as a source. Filters run in order
/// and short-circuit on the first rejection.
pub fn filter_source(opt: &dyn Options, store: &StoreInfo, filters: &[Box<dyn Filter>]) -> bool {
    filters
        .iter()
        .any(|filter| reject(opt, store, filter.as_ref(), "filter-source", true))
}

/// Whether any filter rejects the store as a target.
pub fn filter_target(opt: &dyn Options, store: &StoreInfo, filters: &[Box<dyn Filter>]) -> bool {
    filters
        .iter()
        .any(|filter| reject(opt, store, filter.as_ref(), "filter-target", false))
}

fn reject(
    opt: &dyn Options,
    store: &StoreInfo,
    filter: &dyn Filter,
    action: &str,
    source: bool,
) -> bool {
    let rejected = if source {
        filter.filter_source(opt, store)
    } else {
        filter.filter_target(opt, store)
    };
    if rejected {
        debug!(
            "store rejected by filter";
            "action" => action,
            "store_id" => store.id(),
            "filter" => filter.filter_type(),
        );
        let store_label = store.id().to_string();
        FILTER_COUNTER_VEC
            .with_label_values(&[action, &store_label, filter.filter_type()])
            .inc();
    }
    rejected
}

/// Rejects explicitly listed stores per direction.
pub struct ExcludedFilter {
    sources: HashSet<u64>,
    targets: HashSet<u64>,
}

impl ExcludedFilter {
    pub fn new(sources: HashSet<u64>, targets: HashSet<u64>) -> ExcludedFilter {
        ExcludedFilter { sources, targets }
    }
}

impl Filter for ExcludedFilter {
    fn filter_type(&self) -> &'static str {
        "exclude-filter"
    }

    fn filter_source(&self, _opt: &dyn Options, store: &StoreInfo) -> bool {
        self.sources.contains(&store.id())
    }

    fn filter_target(&self, _opt: &dyn Options, store: &StoreInfo) -> bool {
        self.targets.contains(&store.id())
    }
}

/// Rejects stores an operator has blocked from balance.
pub struct BlockFilter;

impl Filter for BlockFilter {
    fn filter_type(&self) -> &'static str {
        "block-filter"
    }

    fn filter_source(&self, _opt: &dyn Options, store: &StoreInfo) -> bool {
        store.is_blocked()
    }

    fn filter_target(&self, _opt: &dyn Options, store: &StoreInfo) -> bool {
        store.is_blocked()
    }
}

/// Rejects tombstoned sources and any target that is not up.
pub struct StateFilter;

impl Filter for StateFilter {
    fn filter_type(&self) -> &'static str {
        "state-filter"
    }

    fn filter_source(&self, _opt: &dyn Options, store: &StoreInfo) -> bool {
        store.is_tombstone()
    }

    fn filter_target(&self, _opt: &dyn Options, store: &StoreInfo) -> bool {
        !store.is_up()
    }
}

/// Rejects busy stores and stores down longer than the configured limit.
pub struct HealthFilter;

impl HealthFilter {
    fn unhealthy(opt: &dyn Options, store: &StoreInfo) -> bool {
        store.stats.is_busy || store.down_time() > opt.max_store_down_time()
    }
}

impl Filter for HealthFilter {
    fn filter_type(&self) -> &'static str {
        "health-filter"
    }

    fn filter_source(&self, opt: &dyn Options, store: &StoreInfo) -> bool {
        Self::unhealthy(opt, store)
    }

    fn filter_target(&self, opt: &dyn Options, store: &StoreInfo) -> bool {
        Self::unhealthy(opt, store)
    }
}

/// Rejects stores whose heartbeats stopped recently.
pub struct DisconnectFilter;

impl Filter for DisconnectFilter {
    fn filter_type(&self) -> &'static str {
        "disconnect-filter"
    }

    fn filter_source(&self, _opt: &dyn Options, store: &StoreInfo) -> bool {
        store.is_disconnected()
    }

    fn filter_target(&self, _opt: &dyn Options, store: &StoreInfo) -> bool {
        store.is_disconnected()
    }
}

/// Rejects stores carrying too many pending peers. Disabled when the limit
/// is zero.
pub struct PendingPeerCountFilter;

impl PendingPeerCountFilter {
    fn overloaded(opt: &dyn Options, store: &StoreInfo) -> bool {
        if opt.max_pending_peer_count() == 0 {
            return false;
        }
        store.pending_peer_count as u64 > opt.max_pending_peer_count()
    }
}

impl Filter for PendingPeerCountFilter {
    fn filter_type(&self) -> &'static str {
        "pending-peer-filter"
    }

    fn filter_source(&self, opt: &dyn Options, store: &StoreInfo) -> bool {
        Self::overloaded(opt, store)
    }

    fn filter_target(&self, opt: &dyn Options, store: &StoreInfo) -> bool {
        Self::overloaded(opt, store)
    }
}

/// Rejects stores handling too many snapshots in any direction.
pub struct SnapshotCountFilter;

impl SnapshotCountFilter {
    fn busy_snapshotting(opt: &dyn Options, store: &StoreInfo) -> bool {
        let limit = opt.max_snapshot_count();
        u64::from(store.stats.sending_snap_count) > limit
            || u64::from(store.stats.receiving_snap_count) > limit
            || u64::from(store.stats.applying_snap_count) > limit
    }
}

impl Filter for SnapshotCountFilter {
    fn filter_type(&self) -> &'static str {
        "snapshot-filter"
    }

    fn filter_source(&self, opt: &dyn Options, store: &StoreInfo) -> bool {
        Self::busy_snapshotting(opt, store)
    }

    fn filter_target(&self, opt: &dyn Options, store: &StoreInfo) -> bool {
        Self::busy_snapshotting(opt, store)
    }
}

/// Rejects sources recently recorded in the TTL set, so one store is not
/// drained repeatedly within a short window.
pub struct CacheFilter {
    cache: Arc<TtlCache>,
}

impl CacheFilter {
    pub fn new(cache: Arc<TtlCache>) -> CacheFilter {
        CacheFilter { cache }
    }
}

impl Filter for CacheFilter {
    fn filter_type(&self) -> &'static str {
        "cache-filter"
    }

    fn filter_source(&self, _opt: &dyn Options, store: &StoreInfo) -> bool {
        self.cache.exists(store.id())
    }

    fn filter_target(&self, _opt: &dyn Options, store: &StoreInfo) -> bool {
        false
    }
}

/// Rejects targets that are almost full.
pub struct StorageThresholdFilter;

impl Filter for StorageThresholdFilter {
    fn filter_type(&self) -> &'static str {
        "storage-threshold-filter"
    }

    fn filter_source(&self, _opt: &dyn Options, _store: &StoreInfo) -> bool {
        false
    }

    fn filter_target(&self, opt: &dyn Options, store: &StoreInfo) -> bool {
        store.is_low_space(opt.low_space_ratio())
    }
}

/// Rejects targets that would lower the fault-domain diversity of a region's
/// replicas below what its current source provides.
pub struct DistinctScoreFilter {
    labels: Vec<String>,
    stores: Vec<StoreInfo>,
    safe_score: f64,
}

impl DistinctScoreFilter {
    /// `stores` are the stores hosting the region's replicas, including the
    /// source under consideration; the source's own slot is discounted when
    /// capturing its score but still counts against candidates, because its
    /// replica is still in place while candidates are being judged.
    pub fn new(labels: Vec<String>, stores: Vec<StoreInfo>, source: &StoreInfo) -> DistinctScoreFilter {
        let safe_score = distinct_score(&labels, &stores, source);
        DistinctScoreFilter {
            labels,
            stores,
            safe_score,
        }
    }
}

impl Filter for DistinctScoreFilter {
    fn filter_type(&self) -> &'static str {
        "distinct-filter"
    }

    fn filter_source(&self, _opt: &dyn Options, _store: &StoreInfo) -> bool {
        false
    }

    fn filter_target(&self, _opt: &dyn Options, store: &StoreInfo) -> bool {
        distinct_score(&self.labels, &self.stores, store) < self.safe_score
    }
}

/// Rejects stores outside the namespace being scheduled.
pub struct NamespaceFilter {
    classifier: Arc<dyn Classifier>,
    namespace: String,
}

impl NamespaceFilter {
    pub fn new(classifier: Arc<dyn Classifier>, namespace: String) -> NamespaceFilter {
        NamespaceFilter {
            classifier,
            namespace,
        }
    }

    fn outside(&self, store: &StoreInfo) -> bool {
        self.classifier.store_namespace(store) != self.namespace
    }
}

impl Filter for NamespaceFilter {
    fn filter_type(&self) -> &'static str {
        "namespace-filter"
    }

    fn filter_source(&self, _opt: &dyn Options, store: &StoreInfo) -> bool {
        self.outside(store)
    }

    fn filter_target(&self, _opt: &dyn Options, store: &StoreInfo) -> bool {
        self.outside(store)
    }
}

/// Rejects leadership-transfer targets matching the `reject-leader` label
/// property.
pub struct RejectLeaderFilter;

impl Filter for RejectLeaderFilter {
    fn filter_type(&self) -> &'static str {
        "reject-leader-filter"
    }

    fn filter_source(&self, _opt: &dyn Options, _store: &StoreInfo) -> bool {
        false
    }

    fn filter_target(&self, opt: &dyn Options, store: &StoreInfo) -> bool {
        opt.check_label_property(REJECT_LEADER, store.labels())
    }
}
