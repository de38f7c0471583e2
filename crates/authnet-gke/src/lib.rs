// # GKE Cluster Backend
//
// Implements the `ClusterApi` trait against the GKE Container API v1.
//
// ## API Reference
//
// - Get cluster: GET `/v1/projects/{project}/zones/{zone}/clusters/{cluster}`
// - Update cluster: POST `.../clusters/{cluster}:update` with a
//   `desiredMasterAuthorizedNetworksConfig` payload
//
// The update is a wholesale replacement of the master-authorized-networks
// list; the Container API has no partial patch for it.
//
// ## Security
//
// Credentials never appear in logs or Debug output. Tokens come from a
// service-account file via `gcp_auth`; the OAuth2 exchange itself is not
// reimplemented here.

use async_trait::async_trait;
use authnet_core::config::ClusterTarget;
use authnet_core::traits::{AllowlistConfig, ClusterApi};
use authnet_core::{Error, Result};
use gcp_auth::{CustomServiceAccount, TokenProvider};
use std::path::Path;
use std::time::Duration;

mod wire;

/// GKE Container API base URL
const GKE_API_BASE: &str = "https://container.googleapis.com/v1";

/// OAuth2 scopes requested for Container API calls
const CLOUD_PLATFORM_SCOPES: &[&str] = &["https://www.googleapis.com/auth/cloud-platform"];

/// HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of OAuth2 bearer tokens for Container API calls
///
/// Kept as a trait so tests can inject a stub instead of real credentials.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Get a currently valid access token
    async fn access_token(&self) -> Result<String>;
}

/// Token source backed by a service-account credential file
pub struct ServiceAccountTokenSource {
    account: CustomServiceAccount,
}

impl ServiceAccountTokenSource {
    /// Load a service account from a credential file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let account = CustomServiceAccount::from_file(path.as_ref()).map_err(|e| {
            Error::auth(format!(
                "failed to load service account {}: {e}",
                path.as_ref().display()
            ))
        })?;

        Ok(Self { account })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<String> {
        let token = self
            .account
            .token(CLOUD_PLATFORM_SCOPES)
            .await
            .map_err(|e| Error::auth(format!("token exchange failed: {e}")))?;

        Ok(token.as_str().to_string())
    }
}

/// GKE-backed cluster API
///
/// Addressed by the (project, zone, cluster) triple; one authenticated
/// HTTP call per trait method, full error propagation, no retries.
pub struct GkeClusterApi {
    /// Target cluster coordinates
    target: ClusterTarget,

    /// Bearer token source
    tokens: Box<dyn TokenSource>,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// API base URL (overridable for tests/emulators)
    base_url: String,
}

// Credentials and token material stay out of Debug output.
impl std::fmt::Debug for GkeClusterApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GkeClusterApi")
            .field("project", &self.target.project)
            .field("zone", &self.target.zone)
            .field("cluster", &self.target.cluster)
            .field("base_url", &self.base_url)
            .field("tokens", &"<redacted>")
            .finish()
    }
}

impl GkeClusterApi {
    /// Create a cluster API with an explicit token source
    pub fn new(tokens: Box<dyn TokenSource>, target: ClusterTarget) -> Result<Self> {
        target.validate()?;

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::cluster_api(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            target,
            tokens,
            client,
            base_url: GKE_API_BASE.to_string(),
        })
    }

    /// Create a cluster API from a service-account credential file
    pub fn from_credentials_file<P: AsRef<Path>>(
        path: P,
        target: ClusterTarget,
    ) -> Result<Self> {
        let tokens = ServiceAccountTokenSource::from_file(path)?;
        Self::new(Box::new(tokens), target)
    }

    /// Override the API base URL (tests, emulators)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn cluster_url(&self) -> String {
        cluster_url(&self.base_url, &self.target)
    }
}

fn cluster_url(base_url: &str, target: &ClusterTarget) -> String {
    format!(
        "{}/projects/{}/zones/{}/clusters/{}",
        base_url, target.project, target.zone, target.cluster
    )
}

/// Map a non-success Container API status to a specific error
fn status_error(operation: &str, status: reqwest::StatusCode, body: String) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{operation}: invalid credentials or insufficient permissions (HTTP {status})"
        )),
        404 => Error::not_found(format!("{operation}: cluster not found (HTTP {status})")),
        429 => Error::rate_limited(format!("{operation}: API quota exhausted (HTTP {status})")),
        500..=599 => Error::cluster_api(format!(
            "{operation}: server error (HTTP {status}): {body}"
        )),
        _ => Error::cluster_api(format!("{operation} failed (HTTP {status}): {body}")),
    }
}

#[async_trait]
impl ClusterApi for GkeClusterApi {
    async fn authorized_networks(&self) -> Result<AllowlistConfig> {
        let token = self.tokens.access_token().await?;
        let url = self.cluster_url();

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| Error::cluster_api(format!("cluster fetch failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error response".to_string());
            return Err(status_error("cluster fetch", status, body));
        }

        let cluster: wire::Cluster = response
            .json()
            .await
            .map_err(|e| Error::cluster_api(format!("failed to parse cluster response: {e}")))?;

        // A cluster without the config block simply has no allow-list yet.
        let config = cluster
            .master_authorized_networks_config
            .unwrap_or_default();

        tracing::debug!(
            cluster = %self.target.cluster,
            entries = config.cidr_blocks.len(),
            "fetched master authorized networks"
        );

        Ok(config.into())
    }

    async fn replace_authorized_networks(&self, config: &AllowlistConfig) -> Result<()> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}:update", self.cluster_url());

        let request = wire::UpdateClusterRequest {
            update: wire::ClusterUpdate {
                desired_master_authorized_networks_config: config.into(),
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::cluster_api(format!("cluster update failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error response".to_string());
            return Err(status_error("cluster update", status, body));
        }

        tracing::info!(
            cluster = %self.target.cluster,
            entries = config.entries.len(),
            "master authorized networks replaced"
        );

        Ok(())
    }

    fn api_name(&self) -> &'static str {
        "gke"
    }
}
