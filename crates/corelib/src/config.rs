//! Cluster configuration snapshots.
//!
//! A [`ServerConfig`] is an immutable view of cluster membership at one
//! version: which nodes exist, whether they store data, and with what weight.
//! Snapshots are owned and versioned by whoever distributes configuration;
//! everything in this workspace only reads them.

use crate::error::{Error, Result};
use crate::node::{Node, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Monotonic version of a configuration snapshot.
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ConfigVersion(pub u64);

impl fmt::Display for ConfigVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Storage role of a node.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageRole {
    /// Not a storage node (sequencer-only, etc.).
    #[default]
    None,
    /// Serves reads of existing data but takes no new writes.
    ReadOnly,
    ReadWrite,
}

/// Per-node entry of a configuration snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(flatten)]
    pub node: Node,
    #[serde(default)]
    pub storage: StorageRole,
    /// Relative share of new data this node should receive.
    #[serde(default)]
    pub storage_weight: f64,
    #[serde(default = "default_num_shards")]
    pub num_shards: u16,
}

fn default_num_shards() -> u16 {
    1
}

impl NodeConfig {
    /// A read-write storage node with the given weight.
    pub fn storage(node: Node, storage_weight: f64) -> Self {
        Self {
            node,
            storage: StorageRole::ReadWrite,
            storage_weight,
            num_shards: 1,
        }
    }

    pub fn with_storage(mut self, storage: StorageRole) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_num_shards(mut self, num_shards: u16) -> Self {
        self.num_shards = num_shards;
        self
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.node.id
    }

    #[inline]
    pub fn is_storage_node(&self) -> bool {
        self.storage != StorageRole::None
    }

    /// True if new records may be stored on this node: it is a read-write
    /// storage node with a strictly positive, finite weight.
    #[inline]
    pub fn is_writable_storage_node(&self) -> bool {
        self.storage == StorageRole::ReadWrite
            && self.storage_weight.is_finite()
            && self.storage_weight > 0.0
    }
}

/// Immutable cluster membership snapshot.
///
/// Serialized as `{ "version": N, "nodes": [ ... ] }`; node ids must be
/// unique.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawServerConfig", into = "RawServerConfig")]
pub struct ServerConfig {
    version: ConfigVersion,
    nodes: BTreeMap<NodeId, NodeConfig>,
}

#[derive(Serialize, Deserialize)]
struct RawServerConfig {
    #[serde(default)]
    version: ConfigVersion,
    #[serde(default)]
    nodes: Vec<NodeConfig>,
}

impl TryFrom<RawServerConfig> for ServerConfig {
    type Error = Error;

    fn try_from(raw: RawServerConfig) -> Result<Self> {
        let mut nodes = BTreeMap::new();
        for node_cfg in raw.nodes {
            let id = node_cfg.id();
            if nodes.insert(id, node_cfg).is_some() {
                return Err(Error::InvalidConfig(format!("duplicate node {}", id)));
            }
        }
        Ok(Self {
            version: raw.version,
            nodes,
        })
    }
}

impl From<ServerConfig> for RawServerConfig {
    fn from(cfg: ServerConfig) -> Self {
        Self {
            version: cfg.version,
            nodes: cfg.nodes.into_values().collect(),
        }
    }
}

impl ServerConfig {
    pub fn new(version: ConfigVersion) -> Self {
        Self {
            version,
            nodes: BTreeMap::new(),
        }
    }

    /// Add or replace a node entry.
    pub fn with_node(mut self, node_cfg: NodeConfig) -> Self {
        self.nodes.insert(node_cfg.id(), node_cfg);
        self
    }

    /// Parse a snapshot from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        tracing::debug!(version = %cfg.version, nodes = cfg.nodes.len(), "parsed server config");
        Ok(cfg)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[inline]
    pub fn version(&self) -> ConfigVersion {
        self.version
    }

    /// Look up a node, `None` if it is not a cluster member.
    #[inline]
    pub fn get_node(&self, id: NodeId) -> Option<&NodeConfig> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeConfig> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
