//! In-memory state store
//!
//! Holds the last observed IP in process memory only. Used by tests and by
//! runs that deliberately re-learn the IP on every start.

use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::StateStore;

/// Memory-backed state store (not persistent)
#[derive(Debug, Default, Clone)]
pub struct MemoryStateStore {
    state: Arc<RwLock<Option<IpAddr>>>,
}

impl MemoryStateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with an IP
    pub fn with_ip(ip: IpAddr) -> Self {
        Self {
            state: Arc::new(RwLock::new(Some(ip))),
        }
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<Option<IpAddr>, Error> {
        Ok(*self.state.read().await)
    }

    async fn store(&self, ip: IpAddr) -> Result<(), Error> {
        *self.state.write().await = Some(ip);
        Ok(())
    }
}
