//! Sequential copyset selector.
//!
//! Places replicas on consecutive shards of the node set, starting at a fixed
//! offset and wrapping around. Works well for:
//!
//! - Tests that need reproducible copysets
//! - Small clusters where placement doesn't matter
//!
//! # Algorithm
//!
//! 1. Start at `start % nodeset.len()`
//! 2. Walk forward, skipping excluded shards, unavailable shards and shards
//!    on a node that already holds a replica
//! 3. Stop after `r` links, or fail once the walk wraps around
//!
//! # Performance
//!
//! - **Time**: O(n * r) where n = node set size, r = replica count
//! - **Space**: O(r)
//!
//! # Limitations
//!
//! - Doesn't consider weights or failure domains
//! - Concentrates load on the shards right after `start`

use crate::chain::{CopySet, StoreChainLink};
use crate::error::SelectionError;
use crate::strategy::CopySetSelector;
use corelib::nodeset_state::NodeSetState;
use corelib::shard::ShardId;
use std::time::Instant;

/// Deterministic selector: first `r` usable shards after `start`.
///
/// # Example
///
/// ```rust
/// use corelib::{NodeSetState, ShardId};
/// use replication::{CopySetSelector, SequentialSelector};
///
/// let nodeset = vec![ShardId::new(1, 0), ShardId::new(2, 0), ShardId::new(3, 0)];
/// let state = NodeSetState::new(&nodeset);
/// let copyset = SequentialSelector::new(2).select(&nodeset, &[], &state).unwrap();
/// assert_eq!(copyset[0].destination, ShardId::new(1, 0));
/// assert_eq!(copyset[1].destination, ShardId::new(2, 0));
/// ```
#[derive(Debug, Clone)]
pub struct SequentialSelector {
    replication_factor: usize,
    start: usize,
}

impl SequentialSelector {
    /// Create a selector with the given replication factor, starting at the
    /// head of the node set.
    pub fn new(replication_factor: usize) -> Self {
        Self {
            replication_factor,
            start: 0,
        }
    }

    /// Start the walk at `start` (taken modulo the node set size).
    pub fn with_start(mut self, start: usize) -> Self {
        self.start = start;
        self
    }
}

impl CopySetSelector for SequentialSelector {
    fn replication_factor(&self) -> usize {
        self.replication_factor
    }

    fn select(
        &self,
        nodeset: &[ShardId],
        exclude: &[ShardId],
        state: &NodeSetState,
    ) -> Result<CopySet, SelectionError> {
        let now = Instant::now();
        let mut copyset = CopySet::with_capacity(self.replication_factor);
        if self.replication_factor == 0 {
            return Ok(copyset);
        }

        let len = nodeset.len();
        let start = self.start.checked_rem(len).unwrap_or(0);
        for i in 0..len {
            let shard = nodeset[(start + i) % len];

            if exclude.contains(&shard) || !state.is_available(shard, now) {
                continue;
            }
            // One replica per node
            if copyset.iter().any(|l| l.destination.node() == shard.node()) {
                continue;
            }

            copyset.push(StoreChainLink::new(shard));
            if copyset.len() == self.replication_factor {
                return Ok(copyset);
            }
        }

        Err(SelectionError::NotEnoughNodes {
            required: self.replication_factor,
            available: copyset.len(),
        })
    }

    fn name(&self) -> &'static str {
        "SequentialSelector"
    }
}
