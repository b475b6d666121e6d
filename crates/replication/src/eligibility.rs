//! Node eligibility filter.
//!
//! The single definition of which shards of a node set may receive new
//! records under a given configuration. Both preparing a
//! [`CopySetManager`](crate::CopySetManager) and checking it for staleness go
//! through [`effective_nodeset`].

use corelib::config::ServerConfig;
use corelib::shard::{ShardId, StorageSet};

/// Returns the shards of `full_nodeset` whose node is in `cfg` and is a
/// writable storage node (positive weight), in input order.
pub fn effective_nodeset(full_nodeset: &[ShardId], cfg: &ServerConfig) -> StorageSet {
    full_nodeset
        .iter()
        .copied()
        .filter(|shard| {
            cfg.get_node(shard.node())
                .map_or(false, |node_cfg| node_cfg.is_writable_storage_node())
        })
        .collect()
}
