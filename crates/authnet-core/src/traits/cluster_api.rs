// # Cluster API Trait
//
// Defines the interface for reading and replacing a managed cluster's
// authorized-network configuration.
//
// ## Implementations
//
// - GKE Container API v1: `authnet-gke` crate
//
// Implementations are single-shot API calls with full error propagation.
// All decisions about *whether* to write are owned by the reconciler; a
// cluster API never filters or merges entries itself.

use async_trait::async_trait;

/// One authorized-network entry: a CIDR range plus the display name that
/// identifies which agent or purpose owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowlistEntry {
    /// Network range in CIDR notation (e.g. "203.0.113.5/32")
    pub cidr: String,
    /// Logical tag identifying the owner of this entry
    pub display_name: String,
}

impl AllowlistEntry {
    /// Create a new entry
    pub fn new(cidr: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            cidr: cidr.into(),
            display_name: display_name.into(),
        }
    }
}

/// The cluster's authorized-network configuration: an ordered list of
/// entries plus the enabled flag. Owned by the remote service; the agent
/// only ever reads it immediately before writing back a modified copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowlistConfig {
    /// Authorized entries, in remote order
    pub entries: Vec<AllowlistEntry>,
    /// Whether authorized-network enforcement is enabled
    pub enabled: bool,
}

/// Trait for cluster management API implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Fetch the cluster's current authorized-network configuration
    ///
    /// A cluster with no configuration at all is reported as an empty,
    /// disabled [`AllowlistConfig`], not an error.
    async fn authorized_networks(&self) -> Result<AllowlistConfig, crate::Error>;

    /// Replace the cluster's authorized-network configuration wholesale
    ///
    /// This is a full-list replacement, not a partial patch: entries changed
    /// out-of-band between a fetch and this write are silently lost. There
    /// is no concurrency token; last writer wins.
    async fn replace_authorized_networks(
        &self,
        config: &AllowlistConfig,
    ) -> Result<(), crate::Error>;

    /// Get the API name (for logging/debugging)
    fn api_name(&self) -> &'static str;
}
