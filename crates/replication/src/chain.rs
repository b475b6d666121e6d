//! Copyset entries as the store path consumes them.

use corelib::shard::ShardId;
use std::fmt;

/// Connection id a hop uses to forward a chained store to the next hop.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ClientId(pub u32);

impl ClientId {
    /// Not assigned yet; the transport fills it in before sending.
    pub const INVALID: ClientId = ClientId(0);

    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::INVALID
    }
}

/// One selected replica: where to store, plus per-hop chain metadata.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct StoreChainLink {
    pub destination: ShardId,
    pub origin: ClientId,
}

impl StoreChainLink {
    pub fn new(destination: ShardId) -> Self {
        Self {
            destination,
            origin: ClientId::INVALID,
        }
    }
}

impl From<ShardId> for StoreChainLink {
    fn from(destination: ShardId) -> Self {
        Self::new(destination)
    }
}

impl fmt::Display for StoreChainLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.destination)
    }
}

/// Ordered replica list for one record.
pub type CopySet = Vec<StoreChainLink>;
