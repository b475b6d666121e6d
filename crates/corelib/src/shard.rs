//! Shard addressing.
//!
//! A shard is the physical storage unit a record replica lands on: one disk
//! (or partition) of one node. A log's candidate replica set is an ordered
//! list of shards, the [`StorageSet`].

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies shard `shard` on node `node`.
///
/// Equality and ordering are by identity: node first, then shard index.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct ShardId {
    pub node: NodeId,
    pub shard: u16,
}

impl ShardId {
    #[inline]
    pub const fn new(node: u16, shard: u16) -> Self {
        Self {
            node: NodeId(node),
            shard,
        }
    }

    /// The node owning this shard.
    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[inline]
    pub fn shard(&self) -> u16 {
        self.shard
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:S{}", self.node, self.shard)
    }
}

/// Ordered sequence of shards.
///
/// Order is the canonical form used when two storage sets are compared; two
/// sets are equal only if they hold the same shards in the same order.
pub type StorageSet = Vec<ShardId>;
