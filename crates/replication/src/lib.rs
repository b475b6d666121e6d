//! Copyset selection for the write path.
//!
//! This crate decides which shards store the replicas of a record:
//! - Pluggable copyset selectors
//! - The node eligibility filter shared by preparation and staleness checks
//! - The per-log `CopySetManager` that binds a selector to a node set and
//!   orders copysets for direct or chained stores

pub mod chain;
pub mod eligibility;
pub mod error;
pub mod manager;
pub mod strategy;

pub use chain::{ClientId, CopySet, StoreChainLink};
pub use eligibility::effective_nodeset;
pub use error::SelectionError;
pub use manager::{CopySetManager, CopySetManagerOptions};
pub use strategy::{CopySetSelector, RandomSelector, SequentialSelector};
