// # authnet-core
//
// Core library for the authnet allow-list agent.
//
// ## Architecture Overview
//
// - **IpSource**: trait for looking up the host's public IP
// - **ClusterApi**: trait for reading/replacing the remote allow-list
// - **StateStore**: trait for persisting the last observed IP
// - **reconcile**: the allow-list replacement algorithm
// - **Engine**: the polling loop that ties the three together
//
// ## Design Principles
//
// 1. **Separation of concerns**: core logic is separate from integrations
// 2. **Explicit errors**: every operation returns a Result; only the binary
//    entry point decides to terminate the process
// 3. **Library-first**: the engine and reconciler are fully usable (and
//    testable) against trait-object doubles

pub mod config;
pub mod engine;
pub mod error;
pub mod reconcile;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{AgentConfig, ClusterTarget, EngineConfig, IpSourceConfig, StateStoreConfig};
pub use engine::{Engine, EngineEvent, TickOutcome};
pub use error::{Error, Result};
pub use reconcile::{ReconcileOutcome, host_cidr, reconcile};
pub use state::{FileStateStore, MemoryStateStore};
pub use traits::{AllowlistConfig, AllowlistEntry, ClusterApi, IpSource, StateStore};
