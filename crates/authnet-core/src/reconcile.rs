//! Allow-list reconciliation
//!
//! Given a new public IP and the display name tagging this agent's entry,
//! [`reconcile`] fetches the remote authorized-network configuration, drops
//! every entry carrying that display name, appends a fresh single-host entry
//! for the new IP, and pushes the result back as a full replacement.
//!
//! Two details of the walk are load-bearing:
//!
//! - Entries are filtered by display name *unconditionally*: if several
//!   entries share the name, all of them are dropped, so at most one entry
//!   per display name survives a reconcile.
//! - The duplicate short-circuit compares CIDRs only. If any existing entry
//!   already holds the candidate CIDR — even under a *different* display
//!   name — the reconcile returns early without writing, and no new-named
//!   entry is added.

use crate::error::{Error, Result};
use crate::traits::{AllowlistConfig, AllowlistEntry, ClusterApi};
use std::net::IpAddr;
use tracing::{debug, info};

/// Outcome of a reconcile pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The remote configuration was replaced with the candidate entry added
    Replaced {
        /// The CIDR that was written
        cidr: String,
        /// Number of foreign entries carried over unchanged
        kept: usize,
    },

    /// An entry with the candidate CIDR already exists; nothing was written
    AlreadyAuthorized {
        /// The CIDR that was found
        cidr: String,
    },
}

/// Render an IP as the single-host CIDR used for allow-list entries.
pub fn host_cidr(ip: IpAddr) -> String {
    format!("{ip}/32")
}

/// Synchronize the remote allow-list with a newly observed public IP.
///
/// # Returns
///
/// - `Ok(ReconcileOutcome::Replaced)`: a full-list replacement was written
/// - `Ok(ReconcileOutcome::AlreadyAuthorized)`: idempotent no-op, no write
/// - `Err(Error)`: surfaced from the fetch or the update call
pub async fn reconcile(
    api: &dyn ClusterApi,
    ip: IpAddr,
    display_name: &str,
) -> Result<ReconcileOutcome> {
    if display_name.is_empty() {
        return Err(Error::invalid_input("display name cannot be empty"));
    }

    let current = api.authorized_networks().await?;
    let candidate = AllowlistEntry::new(host_cidr(ip), display_name);

    debug!(
        api = api.api_name(),
        entries = current.entries.len(),
        cidr = %candidate.cidr,
        "fetched authorized networks"
    );

    let mut kept = Vec::with_capacity(current.entries.len() + 1);
    for entry in current.entries {
        if entry.cidr == candidate.cidr {
            // CIDR equality alone decides this, regardless of display name.
            debug!(cidr = %entry.cidr, owner = %entry.display_name, "CIDR already authorized");
            return Ok(ReconcileOutcome::AlreadyAuthorized { cidr: entry.cidr });
        }
        if entry.display_name != candidate.display_name {
            kept.push(entry);
        }
    }

    let kept_count = kept.len();
    kept.push(candidate.clone());

    let updated = AllowlistConfig {
        entries: kept,
        enabled: true,
    };

    api.replace_authorized_networks(&updated).await?;

    info!(
        api = api.api_name(),
        cidr = %candidate.cidr,
        name = %candidate.display_name,
        "authorized networks updated"
    );

    Ok(ReconcileOutcome::Replaced {
        cidr: candidate.cidr,
        kept: kept_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_cidr_formats_single_host() {
        let ip: IpAddr = "203.0.113.5".parse().unwrap();
        assert_eq!(host_cidr(ip), "203.0.113.5/32");
    }
}
