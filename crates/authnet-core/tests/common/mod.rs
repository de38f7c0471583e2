//! Test doubles and common utilities for contract tests
//!
//! The doubles count calls through shared atomics so a test can hold a
//! clone while the engine owns the boxed original.

use async_trait::async_trait;
use authnet_core::config::{
    AgentConfig, ClusterTarget, EngineConfig, IpSourceConfig, StateStoreConfig,
};
use authnet_core::error::{Error, Result};
use authnet_core::traits::{AllowlistConfig, AllowlistEntry, ClusterApi, IpSource};
use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted lookup result
#[derive(Debug, Clone)]
pub enum Lookup {
    Ip(IpAddr),
    Fail(&'static str),
}

/// An IP source that replays a fixed script, repeating the last successful
/// lookup once the script is exhausted
#[derive(Clone)]
pub struct ScriptedIpSource {
    script: Arc<Mutex<VecDeque<Lookup>>>,
    last: Arc<Mutex<Option<IpAddr>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    pub fn new(script: Vec<Lookup>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            last: Arc::new(Mutex::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[allow(dead_code)]
    pub fn lookup_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Lookup::Ip(ip)) => {
                *self.last.lock().unwrap() = Some(ip);
                Ok(ip)
            }
            Some(Lookup::Fail(msg)) => Err(Error::ip_lookup(msg)),
            None => self
                .last
                .lock()
                .unwrap()
                .ok_or_else(|| Error::ip_lookup("script exhausted")),
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A cluster API double holding the "remote" configuration in memory
#[derive(Clone)]
pub struct MockClusterApi {
    remote: Arc<Mutex<AllowlistConfig>>,
    fetch_calls: Arc<AtomicUsize>,
    write_calls: Arc<AtomicUsize>,
    fail_fetch: Arc<AtomicBool>,
    fail_replace: Arc<AtomicBool>,
}

impl MockClusterApi {
    pub fn new() -> Self {
        Self::with_entries(Vec::new())
    }

    pub fn with_entries(entries: Vec<AllowlistEntry>) -> Self {
        Self {
            remote: Arc::new(Mutex::new(AllowlistConfig {
                enabled: !entries.is_empty(),
                entries,
            })),
            fetch_calls: Arc::new(AtomicUsize::new(0)),
            write_calls: Arc::new(AtomicUsize::new(0)),
            fail_fetch: Arc::new(AtomicBool::new(false)),
            fail_replace: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Snapshot of the simulated remote configuration
    pub fn remote(&self) -> AllowlistConfig {
        self.remote.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Number of replacement attempts, successful or not
    pub fn write_count(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    #[allow(dead_code)]
    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    #[allow(dead_code)]
    pub fn set_fail_replace(&self, fail: bool) {
        self.fail_replace.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ClusterApi for MockClusterApi {
    async fn authorized_networks(&self) -> Result<AllowlistConfig> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(Error::cluster_api("injected fetch failure"));
        }

        Ok(self.remote.lock().unwrap().clone())
    }

    async fn replace_authorized_networks(&self, config: &AllowlistConfig) -> Result<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_replace.load(Ordering::SeqCst) {
            return Err(Error::cluster_api("injected replace failure"));
        }

        *self.remote.lock().unwrap() = config.clone();
        Ok(())
    }

    fn api_name(&self) -> &'static str {
        "mock"
    }
}

/// Shorthand for building an allow-list entry
pub fn entry(cidr: &str, display_name: &str) -> AllowlistEntry {
    AllowlistEntry::new(cidr, display_name)
}

/// A minimal valid configuration with a short poll interval
#[allow(dead_code)]
pub fn test_config(network_name: &str) -> AgentConfig {
    AgentConfig {
        cluster: ClusterTarget {
            project: "test-project".to_string(),
            zone: "test-zone".to_string(),
            cluster: "test-cluster".to_string(),
        },
        network_name: network_name.to_string(),
        ip_source: IpSourceConfig::default(),
        state_store: StateStoreConfig::Memory,
        engine: EngineConfig {
            poll_interval_secs: 1,
            persist_on_reconcile_failure: true,
            event_channel_capacity: 16,
        },
    }
}
