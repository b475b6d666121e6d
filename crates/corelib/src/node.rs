//! Node abstractions for the cluster.
//!
//! Nodes are the physical storage servers. They are identified by a compact
//! `NodeId` that is cheap to compare and hash.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Compact identifier for a node in the cluster.
///
/// Newtype over the node's index in the cluster configuration.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u16);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// Cluster member as named in a configuration snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Hostname, for logs.
    pub name: String,
}

impl Node {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
