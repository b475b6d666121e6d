//! Selection failures.

use thiserror::Error;

/// The only way a copyset selection can fail.
///
/// A selector either returns a copyset of exactly its replication factor or
/// this error; there is no partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// Fewer eligible, available, non-excluded nodes than replicas required.
    #[error("not enough nodes to select a copyset: required {required}, available {available}")]
    NotEnoughNodes { required: usize, available: usize },
}
