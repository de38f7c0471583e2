//! Configuration types for the authnet agent
//!
//! The configuration is built once at startup (normally from CLI flags) and
//! passed by reference into the engine. There is no global mutable state.

use serde::{Deserialize, Serialize};

/// Main agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Target cluster coordinates
    pub cluster: ClusterTarget,

    /// Display name tagging this agent's allow-list entry
    pub network_name: String,

    /// IP source configuration
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// State store configuration
    #[serde(default)]
    pub state_store: StateStoreConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl AgentConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.cluster.validate()?;

        if self.network_name.is_empty() {
            return Err(crate::Error::config("network name cannot be empty"));
        }

        self.ip_source.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

/// Coordinates of the managed cluster: (project, zone, cluster) triple
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterTarget {
    /// Project identifier
    pub project: String,

    /// Zone where the cluster master lives
    pub zone: String,

    /// Cluster identifier
    pub cluster: String,
}

impl ClusterTarget {
    /// Validate the cluster target
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.project.is_empty() {
            return Err(crate::Error::config("project cannot be empty"));
        }
        if self.zone.is_empty() {
            return Err(crate::Error::config("zone cannot be empty"));
        }
        if self.cluster.is_empty() {
            return Err(crate::Error::config("cluster cannot be empty"));
        }
        Ok(())
    }
}

/// IP source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpSourceConfig {
    /// URL of the public IP echo endpoint
    #[serde(default = "default_echo_url")]
    pub url: String,
}

impl IpSourceConfig {
    /// Validate the IP source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.url.is_empty() {
            return Err(crate::Error::config("IP echo URL cannot be empty"));
        }
        Ok(())
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        Self {
            url: default_echo_url(),
        }
    }
}

/// State store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateStoreConfig {
    /// File-based state store
    File {
        /// Path to the persisted IP file
        path: String,
    },

    /// In-memory state store (not persistent)
    #[default]
    Memory,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Interval between public IP checks (in seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Persist the observed IP even when the remote update fails
    ///
    /// When true the local state always reflects the last *observed* IP, so
    /// a transient API failure will not be retried until the IP changes
    /// again. When false the state keeps the last *successfully applied* IP
    /// and the next tick retries the update.
    #[serde(default = "default_persist_on_reconcile_failure")]
    pub persist_on_reconcile_failure: bool,

    /// Capacity of the internal event channel
    ///
    /// When full, new engine events are dropped with a warning log.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("poll interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            persist_on_reconcile_failure: default_persist_on_reconcile_failure(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_echo_url() -> String {
    "http://checkip.amazonaws.com/".to_string()
}

fn default_poll_interval_secs() -> u64 {
    180
}

fn default_persist_on_reconcile_failure() -> bool {
    true
}

fn default_event_channel_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AgentConfig {
        AgentConfig {
            cluster: ClusterTarget {
                project: "my-project".to_string(),
                zone: "us-central1-c".to_string(),
                cluster: "my-cluster".to_string(),
            },
            network_name: "home".to_string(),
            ip_source: IpSourceConfig::default(),
            state_store: StateStoreConfig::Memory,
            engine: EngineConfig::default(),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn empty_fields_rejected() {
        let mut config = valid_config();
        config.cluster.project = String::new();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.cluster.zone = String::new();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.cluster.cluster = String::new();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.network_name = String::new();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.ip_source.url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_poll_interval_rejected() {
        let mut config = valid_config();
        config.engine.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn defaults_survive_serde_round_trip() {
        let config = valid_config();
        let json = serde_json::to_string(&config).unwrap();
        let back: AgentConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(back.engine.poll_interval_secs, 180);
        assert!(back.engine.persist_on_reconcile_failure);
        assert_eq!(back.ip_source.url, "http://checkip.amazonaws.com/");
    }
}
