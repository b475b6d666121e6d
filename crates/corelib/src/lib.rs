//! Core library for copyset selection.
//!
//! This crate provides the cluster vocabulary shared by the write path:
//! - Node and shard identities
//! - Storage sets (ordered candidate shard lists)
//! - Cluster configuration snapshots
//! - Shared per-shard availability state

pub mod config;
pub mod error;
pub mod node;
pub mod nodeset_state;
pub mod shard;

pub use config::{ConfigVersion, NodeConfig, ServerConfig, StorageRole};
pub use error::{Error, Result};
pub use node::{Node, NodeId};
pub use nodeset_state::{NodeSetState, NotAvailableReason};
pub use shard::{ShardId, StorageSet};
