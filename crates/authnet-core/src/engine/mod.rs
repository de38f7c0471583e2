//! Core polling engine
//!
//! The engine owns the check-compare-update loop:
//!
//! 1. Look up the current public IP via [`IpSource`]
//! 2. Compare it with the persisted IP from [`StateStore`]
//! 3. On change, run the allow-list [`reconcile`] against [`ClusterApi`]
//! 4. Persist the observed IP (policy-controlled on reconcile failure)
//! 5. Emit an event for monitoring/tests
//!
//! ## Error eras
//!
//! Startup (the first lookup and reconcile, run before the loop starts) is
//! strict: any failure propagates out of [`Engine::run`] so the caller can
//! terminate the process. In steady state a reconcile failure is logged and
//! the loop continues; a lookup or state-store failure ends the loop by
//! returning the error.
//!
//! ## Shutdown
//!
//! The loop stops on an explicit signal: SIGINT in production, a oneshot
//! channel in tests. There is no other exit path besides the lookup-failure
//! contract above.

use crate::config::AgentConfig;
use crate::error::Result;
use crate::reconcile::{ReconcileOutcome, reconcile};
use crate::traits::{ClusterApi, IpSource, StateStore};
use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Events emitted by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started,

    /// Looked-up IP differs from the persisted one
    IpChangeDetected {
        previous: Option<IpAddr>,
        new_ip: IpAddr,
    },

    /// Allow-list replacement was written
    ReconcileApplied { cidr: String },

    /// Allow-list already contained the CIDR; no write performed
    ReconcileSkipped { cidr: String },

    /// Allow-list update failed (loop continues)
    ReconcileFailed { error: String },

    /// Engine stopped
    Stopped { reason: String },
}

/// Result of one steady-state tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Looked-up IP matches the persisted one; nothing was done
    Unchanged(IpAddr),

    /// IP changed and the allow-list was reconciled
    Reconciled {
        ip: IpAddr,
        outcome: ReconcileOutcome,
    },

    /// IP changed but the allow-list update failed; persistence followed
    /// the configured policy
    ReconcileFailed { ip: IpAddr },
}

/// The polling engine
///
/// Single logical worker: exactly one engine owns the persisted state and
/// the remote configuration, so no locking is needed beyond what the
/// collaborators do internally.
pub struct Engine {
    /// Public IP source
    ip_source: Box<dyn IpSource>,

    /// Cluster management API
    cluster: Box<dyn ClusterApi>,

    /// Persisted last-observed IP
    state: Box<dyn StateStore>,

    /// Display name tagging this agent's allow-list entry
    network_name: String,

    /// Interval between ticks
    poll_interval: Duration,

    /// Persist the observed IP even when the remote update fails
    persist_on_reconcile_failure: bool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl Engine {
    /// Create a new engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields
    /// engine events.
    pub fn new(
        ip_source: Box<dyn IpSource>,
        cluster: Box<dyn ClusterApi>,
        state: Box<dyn StateStore>,
        config: &AgentConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            ip_source,
            cluster,
            state,
            network_name: config.network_name.clone(),
            poll_interval: Duration::from_secs(config.engine.poll_interval_secs),
            persist_on_reconcile_failure: config.engine.persist_on_reconcile_failure,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run the engine until shutdown or an unrecoverable lookup failure
    ///
    /// # Returns
    ///
    /// - `Ok(())`: clean shutdown (SIGINT)
    /// - `Err(Error)`: startup failure, or a lookup/state failure in the loop
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run with a controlled shutdown signal instead of SIGINT
    ///
    /// Used by integration tests that need deterministic shutdown.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(EngineEvent::Started);

        // Startup era: look up, reconcile and persist unconditionally, even
        // when the persisted IP is already current. Any failure is fatal.
        let ip = self.ip_source.current().await?;
        info!(%ip, source = self.ip_source.source_name(), "initial public IP");

        let outcome = reconcile(self.cluster.as_ref(), ip, &self.network_name).await?;
        self.emit_reconcile_outcome(&outcome);
        self.state.store(ip).await?;

        // Steady state
        if let Some(mut rx) = shutdown_rx {
            // Test mode: wait for the provided shutdown signal
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {
                        if let Err(e) = self.steady_tick().await {
                            return Err(e);
                        }
                    }

                    _ = &mut rx => {
                        info!("shutdown signal received");
                        self.emit_event(EngineEvent::Stopped {
                            reason: "shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        } else {
            // Production mode: wait for SIGINT
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(self.poll_interval) => {
                        if let Err(e) = self.steady_tick().await {
                            return Err(e);
                        }
                    }

                    _ = tokio::signal::ctrl_c() => {
                        info!("shutdown signal received");
                        self.emit_event(EngineEvent::Stopped {
                            reason: "shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// One loop iteration; `Err` means the loop must end
    async fn steady_tick(&self) -> Result<()> {
        match self.check_and_reconcile().await {
            Ok(outcome) => {
                debug!(?outcome, "tick complete");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "lookup failed, stopping the polling loop");
                self.emit_event(EngineEvent::Stopped {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Perform one check-compare-update tick
    ///
    /// Lookup and state-store errors propagate; a reconcile failure is
    /// reported in the outcome and, per policy, still persists the observed
    /// IP so the local cache reflects the last observed address.
    pub async fn check_and_reconcile(&self) -> Result<TickOutcome> {
        let current = self.ip_source.current().await?;
        let previous = self.state.load().await?;

        if previous == Some(current) {
            debug!(ip = %current, "public IP unchanged");
            return Ok(TickOutcome::Unchanged(current));
        }

        info!(?previous, new_ip = %current, "IP change detected");
        self.emit_event(EngineEvent::IpChangeDetected {
            previous,
            new_ip: current,
        });

        match reconcile(self.cluster.as_ref(), current, &self.network_name).await {
            Ok(outcome) => {
                self.emit_reconcile_outcome(&outcome);
                self.state.store(current).await?;
                Ok(TickOutcome::Reconciled {
                    ip: current,
                    outcome,
                })
            }
            Err(e) => {
                warn!(error = %e, "unable to update the cluster allow-list");
                self.emit_event(EngineEvent::ReconcileFailed {
                    error: e.to_string(),
                });

                if self.persist_on_reconcile_failure {
                    self.state.store(current).await?;
                }

                Ok(TickOutcome::ReconcileFailed { ip: current })
            }
        }
    }

    fn emit_reconcile_outcome(&self, outcome: &ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Replaced { cidr, .. } => {
                self.emit_event(EngineEvent::ReconcileApplied { cidr: cidr.clone() });
            }
            ReconcileOutcome::AlreadyAuthorized { cidr } => {
                debug!(%cidr, "allow-list already current");
                self.emit_event(EngineEvent::ReconcileSkipped { cidr: cidr.clone() });
            }
        }
    }

    /// Emit an engine event, dropping it with a warning when the channel
    /// is full or the receiver is gone
    fn emit_event(&self, event: EngineEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("event channel full or closed, dropping event");
        }
    }
}
