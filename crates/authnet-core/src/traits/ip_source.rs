// # IP Source Trait
//
// Defines the interface for looking up the host's current public IP.
//
// ## Implementations
//
// - HTTP echo endpoint: `authnet-ip-http` crate
//
// The engine owns the polling cadence; a source performs exactly one lookup
// per call and must not spawn background tasks or cache results.

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for public IP source implementations
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Look up the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current public IP
    /// - `Err(Error)`: Network failure, non-2xx response, or unparseable body
    async fn current(&self) -> Result<IpAddr, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
