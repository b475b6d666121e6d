//! Shared per-shard availability of a log's node set.
//!
//! Health tracking (timeouts, overload and out-of-space replies, probing)
//! happens elsewhere; it records its verdicts here as "not available until
//! deadline, because reason". Copyset selectors consult this view on every
//! selection. One `NodeSetState` is typically shared through an `Arc` by
//! every component serving the same log, so all mutation goes through
//! `&self`.

use crate::shard::{ShardId, StorageSet};
use dashmap::DashMap;
use std::time::Instant;

/// Why a shard should not currently receive stores.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Hash)]
pub enum NotAvailableReason {
    #[default]
    None,
    Overloaded,
    NoSpace,
    Unroutable,
    StoreDisabled,
    Slow,
    /// Recovering from one of the above; a single probe store is in flight.
    Probing,
}

#[derive(Copy, Clone, Debug)]
struct ShardAvailability {
    until: Instant,
    reason: NotAvailableReason,
}

/// Availability view over the shards of one node set.
#[derive(Debug, Default)]
pub struct NodeSetState {
    shards: DashMap<ShardId, Option<ShardAvailability>>,
}

impl NodeSetState {
    /// Track `nodeset`, every shard initially available.
    pub fn new(nodeset: &[ShardId]) -> Self {
        let shards = DashMap::with_capacity(nodeset.len());
        for shard in nodeset {
            shards.insert(*shard, None);
        }
        Self { shards }
    }

    /// Mark `shard` unavailable until `until`. Ignored for shards outside the
    /// tracked node set.
    pub fn set_not_available_until(
        &self,
        shard: ShardId,
        until: Instant,
        reason: NotAvailableReason,
    ) {
        if reason == NotAvailableReason::None {
            self.clear(shard);
            return;
        }
        match self.shards.get_mut(&shard) {
            Some(mut entry) => {
                tracing::trace!(%shard, ?reason, "shard marked not available");
                *entry = Some(ShardAvailability { until, reason });
            }
            None => tracing::debug!(%shard, "ignoring availability update for untracked shard"),
        }
    }

    pub fn clear(&self, shard: ShardId) {
        if let Some(mut entry) = self.shards.get_mut(&shard) {
            *entry = None;
        }
    }

    /// Current reason `shard` is unavailable at `now`; `None` once the
    /// deadline has passed or if the shard is not tracked.
    pub fn not_available_reason(&self, shard: ShardId, now: Instant) -> NotAvailableReason {
        match self.shards.get(&shard).and_then(|entry| *entry) {
            Some(a) if a.until > now => a.reason,
            _ => NotAvailableReason::None,
        }
    }

    #[inline]
    pub fn is_available(&self, shard: ShardId, now: Instant) -> bool {
        self.not_available_reason(shard, now) == NotAvailableReason::None
    }

    /// Available shards of `nodeset`, in input order.
    pub fn available(&self, nodeset: &[ShardId], now: Instant) -> StorageSet {
        nodeset
            .iter()
            .copied()
            .filter(|s| self.is_available(*s, now))
            .collect()
    }

    pub fn contains(&self, shard: ShardId) -> bool {
        self.shards.contains_key(&shard)
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }
}
