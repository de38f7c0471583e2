// # State Store Trait
//
// Defines the interface for persisting the last observed public IP.
//
// The store holds a single value with no history: created on the first
// successful lookup, read once per tick, overwritten on change.
//
// ## Implementations
//
// - File-based (`ip.txt`): `crate::state::FileStateStore`
// - In-memory (tests): `crate::state::MemoryStateStore`

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for state store implementations
///
/// All methods must be safe to call concurrently from multiple tasks,
/// although the engine is the only writer in practice.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the last observed IP
    ///
    /// # Returns
    ///
    /// - `Ok(Some(IpAddr))`: The persisted IP
    /// - `Ok(None)`: No IP has been persisted yet
    /// - `Err(Error)`: Storage error
    async fn load(&self) -> Result<Option<IpAddr>, crate::Error>;

    /// Overwrite the persisted IP
    async fn store(&self, ip: IpAddr) -> Result<(), crate::Error>;
}
