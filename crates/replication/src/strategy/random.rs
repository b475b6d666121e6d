//! Uniform random copyset selector.
//!
//! Every usable shard of the node set is equally likely to be picked.
//! Weights and failure domains are ignored; those belong to dedicated
//! selectors.

use crate::chain::{CopySet, StoreChainLink};
use crate::error::SelectionError;
use crate::strategy::CopySetSelector;
use corelib::nodeset_state::NodeSetState;
use corelib::shard::ShardId;
use rand::seq::SliceRandom;
use std::time::Instant;

/// Picks `r` shards on distinct nodes uniformly at random, using the
/// calling thread's RNG.
#[derive(Debug, Clone)]
pub struct RandomSelector {
    replication_factor: usize,
}

impl RandomSelector {
    pub fn new(replication_factor: usize) -> Self {
        Self { replication_factor }
    }
}

impl CopySetSelector for RandomSelector {
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
        let mut candidates: Vec<ShardId> = nodeset
            .iter()
            .copied()
            .filter(|s| !exclude.contains(s) && state.is_available(*s, now))
            .collect();
        candidates.shuffle(&mut rand::thread_rng());

        let mut copyset = CopySet::with_capacity(self.replication_factor);
        for shard in candidates {
            if copyset.len() == self.replication_factor {
                break;
            }
            if copyset.iter().any(|l| l.destination.node() == shard.node()) {
                continue;
            }
            copyset.push(StoreChainLink::new(shard));
        }

        if copyset.len() < self.replication_factor {
            return Err(SelectionError::NotEnoughNodes {
                required: self.replication_factor,
                available: copyset.len(),
            });
        }
        Ok(copyset)
    }

    fn name(&self) -> &'static str {
        "RandomSelector"
    }
}
