// # HTTP Echo IP Source
//
// Looks up the host's public IP by querying an HTTP echo service that
// returns the caller's address as the entire response body.
//
// One GET per call; the engine owns the polling cadence. A non-2xx status,
// a network failure, or an unparseable body all surface as lookup errors
// for the engine to act on.

use async_trait::async_trait;
use authnet_core::traits::IpSource;
use authnet_core::{Error, Result};
use std::net::IpAddr;
use std::time::Duration;

/// Default public IP echo endpoint
pub const DEFAULT_ECHO_URL: &str = "http://checkip.amazonaws.com/";

/// Request timeout for echo lookups
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based public IP source
pub struct HttpIpSource {
    /// URL of the echo endpoint
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a source querying the given echo endpoint
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if url.is_empty() {
            return Err(Error::config("IP echo URL cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::ip_lookup(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { url, client })
    }
}

impl Default for HttpIpSource {
    fn default() -> Self {
        // The default URL is non-empty and the default client builder
        // cannot fail, so this cannot panic in practice.
        Self::new(DEFAULT_ECHO_URL).unwrap_or_else(|_| Self {
            url: DEFAULT_ECHO_URL.to_string(),
            client: reqwest::Client::new(),
        })
    }
}

/// Interpret an echo response body as an IP address.
///
/// Echo services terminate the body with a newline; surrounding whitespace
/// is stripped before parsing.
fn parse_echo_body(body: &str) -> Result<IpAddr> {
    let trimmed = body.trim();
    trimmed
        .parse()
        .map_err(|_| Error::ip_lookup(format!("echo response is not an IP address: {trimmed:?}")))
}

#[async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddr> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::ip_lookup(format!("request to {} failed: {e}", self.url)))?;

        if !response.status().is_success() {
            return Err(Error::ip_lookup(format!(
                "{} returned HTTP {}",
                self.url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_lookup(format!("failed to read echo response: {e}")))?;

        let ip = parse_echo_body(&body)?;
        tracing::debug!(%ip, url = %self.url, "public IP looked up");
        Ok(ip)
    }

    fn source_name(&self) -> &'static str {
        "http-echo"
    }
}
