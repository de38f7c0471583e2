//! Container API v1 wire types
//!
//! Only the fields this agent touches are modeled; everything else in the
//! cluster resource is ignored on deserialization.

use authnet_core::traits::{AllowlistConfig, AllowlistEntry};
use serde::{Deserialize, Serialize};

/// The subset of the cluster resource we read
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    #[serde(default)]
    pub master_authorized_networks_config: Option<MasterAuthorizedNetworksConfig>,
}

/// `masterAuthorizedNetworksConfig` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MasterAuthorizedNetworksConfig {
    pub enabled: bool,
    pub cidr_blocks: Vec<CidrBlock>,
}

/// One authorized CIDR block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CidrBlock {
    pub display_name: String,
    pub cidr_block: String,
}

/// Body of the `clusters/{cluster}:update` call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClusterRequest {
    pub update: ClusterUpdate,
}

/// `ClusterUpdate` with the one desired field this agent manages
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterUpdate {
    pub desired_master_authorized_networks_config: MasterAuthorizedNetworksConfig,
}

impl From<MasterAuthorizedNetworksConfig> for AllowlistConfig {
    fn from(config: MasterAuthorizedNetworksConfig) -> Self {
        AllowlistConfig {
            entries: config
                .cidr_blocks
                .into_iter()
                .map(|block| AllowlistEntry::new(block.cidr_block, block.display_name))
                .collect(),
            enabled: config.enabled,
        }
    }
}

impl From<&AllowlistConfig> for MasterAuthorizedNetworksConfig {
    fn from(config: &AllowlistConfig) -> Self {
        MasterAuthorizedNetworksConfig {
            enabled: config.enabled,
            cidr_blocks: config
                .entries
                .iter()
                .map(|entry| CidrBlock {
                    display_name: entry.display_name.clone(),
                    cidr_block: entry.cidr.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_response_parses_authorized_networks() {
        let json = r#"{
            "name": "my-cluster",
            "masterAuthorizedNetworksConfig": {
                "enabled": true,
                "cidrBlocks": [
                    {"displayName": "home", "cidrBlock": "1.2.3.4/32"},
                    {"displayName": "office", "cidrBlock": "9.9.9.9/32"}
                ]
            }
        }"#;

        let cluster: Cluster = serde_json::from_str(json).unwrap();
        let config: AllowlistConfig = cluster.master_authorized_networks_config.unwrap().into();

        assert!(config.enabled);
        assert_eq!(config.entries.len(), 2);
        assert_eq!(config.entries[0], AllowlistEntry::new("1.2.3.4/32", "home"));
        assert_eq!(config.entries[1], AllowlistEntry::new("9.9.9.9/32", "office"));
    }

    #[test]
    fn cluster_without_the_block_reads_as_absent() {
        let cluster: Cluster = serde_json::from_str(r#"{"name": "bare"}"#).unwrap();
        assert!(cluster.master_authorized_networks_config.is_none());
    }

    #[test]
    fn entries_missing_a_display_name_still_parse() {
        let json = r#"{"enabled": true, "cidrBlocks": [{"cidrBlock": "1.2.3.4/32"}]}"#;
        let config: MasterAuthorizedNetworksConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.cidr_blocks[0].display_name, "");
    }

    #[test]
    fn update_request_uses_camel_case_keys() {
        let allowlist = AllowlistConfig {
            entries: vec![AllowlistEntry::new("5.6.7.8/32", "home")],
            enabled: true,
        };

        let request = UpdateClusterRequest {
            update: ClusterUpdate {
                desired_master_authorized_networks_config: (&allowlist).into(),
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "update": {
                    "desiredMasterAuthorizedNetworksConfig": {
                        "enabled": true,
                        "cidrBlocks": [
                            {"displayName": "home", "cidrBlock": "5.6.7.8/32"}
                        ]
                    }
                }
            })
        );
    }

    #[test]
    fn conversion_preserves_entry_order() {
        let allowlist = AllowlistConfig {
            entries: vec![
                AllowlistEntry::new("1.1.1.1/32", "a"),
                AllowlistEntry::new("2.2.2.2/32", "b"),
            ],
            enabled: true,
        };

        let wire: MasterAuthorizedNetworksConfig = (&allowlist).into();
        let back: AllowlistConfig = wire.into();
        assert_eq!(back, allowlist);
    }
}
