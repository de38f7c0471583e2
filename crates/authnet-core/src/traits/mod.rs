//! Trait seams between the engine and its collaborators
//!
//! - [`IpSource`]: fetches the host's current public IP
//! - [`ClusterApi`]: reads and replaces the remote authorized-network list
//! - [`StateStore`]: persists the last observed IP across restarts

pub mod cluster_api;
pub mod ip_source;
pub mod state_store;

pub use cluster_api::{AllowlistConfig, AllowlistEntry, ClusterApi};
pub use ip_source::IpSource;
pub use state_store::StateStore;
