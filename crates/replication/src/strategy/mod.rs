//! Copyset selector abstractions.
//!
//! A copyset selector decides which shards of a log's node set receive the
//! replicas of one record. Different selectors optimize for different goals:
//!
//! - **SequentialSelector**: deterministic walk of the node set
//! - **RandomSelector**: uniform sample of available shards
//!
//! Weighted and failure-domain aware selectors plug in through the same
//! trait.

pub mod random;
pub mod sequential;

pub use random::RandomSelector;
pub use sequential::SequentialSelector;

use crate::chain::CopySet;
use crate::error::SelectionError;
use corelib::nodeset_state::NodeSetState;
use corelib::shard::ShardId;

/// Trait for copyset selection algorithms.
///
/// A selector determines:
/// 1. How many replicas to create for a record
/// 2. Which shards should hold those replicas, and in which order
///
/// # Thread Safety
///
/// Implementations must be thread-safe (Send + Sync): one selector serves
/// every writer of its log concurrently.
pub trait CopySetSelector: Send + Sync + 'static {
    /// Get the number of replicas this selector picks.
    ///
    /// # Returns
    /// Replication factor (typically 2-5)
    fn replication_factor(&self) -> usize;

    /// Pick a copyset from `nodeset`.
    ///
    /// # Arguments
    /// * `nodeset` - Eligible shards, in canonical order
    /// * `exclude` - Shards that must not be picked (e.g. a previous wave's failures)
    /// * `state` - Shared availability of the node set
    ///
    /// # Returns
    /// Exactly `replication_factor()` links on distinct nodes, or
    /// `SelectionError::NotEnoughNodes`. The order is meaningful for chain
    /// sending.
    fn select(
        &self,
        nodeset: &[ShardId],
        exclude: &[ShardId],
        state: &NodeSetState,
    ) -> Result<CopySet, SelectionError>;

    /// Get the selector name (for logging/debugging).
    fn name(&self) -> &'static str;
}
