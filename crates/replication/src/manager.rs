//! Copyset manager.
//!
//! Sits between the per-write hot path and slowly changing cluster
//! membership. It owns one [`CopySetSelector`], remembers which node set the
//! selector was prepared for, and post-processes selected copysets before
//! the store goes out.
//!
//! # Lifecycle
//!
//! ```text
//! new() ──► UNPREPARED ──prepare()──► PREPARED ◄──┐
//!                                        │        │ prepare() on reconfiguration
//!                                        └────────┘
//! ```
//!
//! `matches_config` is only meaningful once prepared. It recomputes the
//! eligible subset of the full node set against a configuration and compares
//! it with the subset cached by the last `prepare`. A mismatch tells the
//! caller to re-prepare (and usually rebuild the selector) before trusting
//! further selections.
//!
//! # Concurrency
//!
//! Writers share the manager (`Arc<CopySetManager>`) and only need `&self`:
//! selection, shuffling and staleness checks never mutate manager state
//! besides the one-way shuffle flag. `prepare` takes `&mut self`, so
//! configuration updates have to hold exclusive access.

use crate::chain::{CopySet, StoreChainLink};
use crate::eligibility::effective_nodeset;
use crate::error::SelectionError;
use crate::strategy::CopySetSelector;
use corelib::config::ServerConfig;
use corelib::nodeset_state::NodeSetState;
use corelib::shard::{ShardId, StorageSet};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Tunables for a [`CopySetManager`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopySetManagerOptions {
    /// Shuffle copysets of non-chained stores.
    pub shuffle_copysets: bool,
}

impl Default for CopySetManagerOptions {
    fn default() -> Self {
        Self {
            shuffle_copysets: true,
        }
    }
}

/// Per-log copyset selection front end.
pub struct CopySetManager {
    selector: Box<dyn CopySetSelector>,
    nodeset_state: Arc<NodeSetState>,
    /// Node set the selector was prepared for.
    full_nodeset: StorageSet,
    /// `full_nodeset` filtered by the config passed to the last `prepare`.
    effective_nodeset: StorageSet,
    shuffle_copysets: AtomicBool,
}

impl CopySetManager {
    pub fn new(selector: Box<dyn CopySetSelector>, nodeset_state: Arc<NodeSetState>) -> Self {
        Self::with_options(selector, nodeset_state, CopySetManagerOptions::default())
    }

    pub fn with_options(
        selector: Box<dyn CopySetSelector>,
        nodeset_state: Arc<NodeSetState>,
        options: CopySetManagerOptions,
    ) -> Self {
        Self {
            selector,
            nodeset_state,
            full_nodeset: StorageSet::new(),
            effective_nodeset: StorageSet::new(),
            shuffle_copysets: AtomicBool::new(options.shuffle_copysets),
        }
    }

    /// Bind the manager to `nodeset` under `cfg`.
    ///
    /// Must run at least once before [`matches_config`](Self::matches_config).
    pub fn prepare(&mut self, nodeset: StorageSet, cfg: &ServerConfig) {
        self.effective_nodeset = effective_nodeset(&nodeset, cfg);
        self.full_nodeset = nodeset;
        metrics::counter!("copyset_manager.prepare").increment(1);
        debug!(
            selector = self.selector.name(),
            config_version = %cfg.version(),
            full = self.full_nodeset.len(),
            effective = self.effective_nodeset.len(),
            "prepared copyset manager"
        );
    }

    /// Whether the eligible part of the node set under `cfg` is exactly the
    /// one cached by the last `prepare` (same shards, same order).
    ///
    /// # Panics
    ///
    /// If the manager was never prepared.
    pub fn matches_config(&self, cfg: &ServerConfig) -> bool {
        assert!(
            !self.full_nodeset.is_empty(),
            "matches_config() called on a copyset manager that was never prepared"
        );
        let matches = self.effective_nodeset == effective_nodeset(&self.full_nodeset, cfg);
        if !matches {
            metrics::counter!("copyset_manager.config_mismatch").increment(1);
            debug!(
                selector = self.selector.name(),
                config_version = %cfg.version(),
                "effective nodeset changed, copyset manager is stale"
            );
        }
        matches
    }

    /// Pick a copyset from the prepared effective node set, never choosing
    /// a shard in `exclude`. Selector failures are returned as-is.
    pub fn select_copyset(&self, exclude: &[ShardId]) -> Result<CopySet, SelectionError> {
        let res = self
            .selector
            .select(&self.effective_nodeset, exclude, &self.nodeset_state);
        match &res {
            Ok(copyset) => trace!(
                selector = self.selector.name(),
                size = copyset.len(),
                "selected copyset"
            ),
            Err(err) => {
                metrics::counter!("copyset_manager.selection_failed").increment(1);
                debug!(selector = self.selector.name(), %err, "copyset selection failed");
            }
        }
        res
    }

    /// Reorder a freshly selected copyset in place before storing.
    ///
    /// Chained stores keep the selector's order: it encodes the relay path,
    /// and permuting it adds cross-domain hops and skews rebuilding load.
    /// Direct fan-out stores get a uniform shuffle from the thread-local RNG
    /// unless shuffling is disabled.
    pub fn shuffle_copyset(&self, copyset: &mut [StoreChainLink], chain: bool) {
        if !chain && self.shuffling_enabled() {
            copyset.shuffle(&mut rand::thread_rng());
        }
    }

    /// Select, then shuffle according to `chain`.
    pub fn select_and_shuffle(
        &self,
        exclude: &[ShardId],
        chain: bool,
    ) -> Result<CopySet, SelectionError> {
        let mut copyset = self.select_copyset(exclude)?;
        self.shuffle_copyset(&mut copyset, chain);
        Ok(copyset)
    }

    /// Stop shuffling for the rest of this manager's life.
    pub fn disable_copyset_shuffling(&self) {
        if self.shuffle_copysets.swap(false, Ordering::Relaxed) {
            info!(selector = self.selector.name(), "copyset shuffling disabled");
        }
    }

    #[inline]
    pub fn shuffling_enabled(&self) -> bool {
        self.shuffle_copysets.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_prepared(&self) -> bool {
        !self.full_nodeset.is_empty()
    }

    pub fn selector(&self) -> &dyn CopySetSelector {
        self.selector.as_ref()
    }

    pub fn nodeset_state(&self) -> &Arc<NodeSetState> {
        &self.nodeset_state
    }

    pub fn full_nodeset(&self) -> &[ShardId] {
        &self.full_nodeset
    }

    pub fn effective_nodeset(&self) -> &[ShardId] {
        &self.effective_nodeset
    }
}

impl fmt::Debug for CopySetManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopySetManager")
            .field("selector", &self.selector.name())
            .field("full_nodeset", &self.full_nodeset)
            .field("effective_nodeset", &self.effective_nodeset)
            .field("shuffle_copysets", &self.shuffling_enabled())
            .finish()
    }
}
