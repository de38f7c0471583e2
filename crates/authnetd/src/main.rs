// # authnetd — allow-list agent daemon
//
// Thin integration layer only: parse flags, prepare the per-user state
// directory and log file, wire the components, run the engine. All
// allow-list logic lives in authnet-core.
//
// ## Files
//
// Under `$HOME/.gke_ip_update/`:
// - `ip.txt` — last observed public IP
// - `gke_ip_update.log` — append-only copy of the daemon's log output
//
// ## Example
//
// ```bash
// authnetd \
//     --service-account /etc/gke/sa.json \
//     --project my-project \
//     --zone us-central1-c \
//     --cluster my-cluster \
//     --network_name home
// ```

use anyhow::Result;
use authnet_core::config::{
    AgentConfig, ClusterTarget, EngineConfig, IpSourceConfig, StateStoreConfig,
};
use authnet_core::traits::StateStore;
use authnet_core::{Engine, FileStateStore, MemoryStateStore};
use authnet_gke::GkeClusterApi;
use authnet_ip_http::{DEFAULT_ECHO_URL, HttpIpSource};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Per-user state directory under $HOME
const STATE_DIR_NAME: &str = ".gke_ip_update";

/// File holding the last observed public IP
const IP_FILE_NAME: &str = "ip.txt";

/// Append-only log file
const LOG_FILE_NAME: &str = "gke_ip_update.log";

/// Exit codes for different termination scenarios
///
/// - 0: clean shutdown
/// - 1: configuration or startup error
/// - 2: runtime error (including a dead lookup endpoint)
#[derive(Debug, Clone, Copy)]
enum AgentExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<AgentExitCode> for ExitCode {
    fn from(code: AgentExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Keeps a GKE cluster's master-authorized-networks list in sync with this
/// host's public IP.
#[derive(Parser, Debug)]
#[command(name = "authnetd", version, about)]
struct Args {
    /// Path to the service account credential file.
    #[arg(long = "service-account")]
    service_account: PathBuf,

    /// Project identifier.
    #[arg(long)]
    project: String,

    /// Cluster identifier.
    #[arg(long)]
    cluster: String,

    /// Zone where the cluster master lives.
    #[arg(long)]
    zone: String,

    /// Display name for the managed allow-list entry.
    #[arg(long = "network_name")]
    network_name: String,

    /// Public IP echo endpoint.
    #[arg(long, default_value = DEFAULT_ECHO_URL)]
    ip_echo_url: String,

    /// Seconds between public IP checks.
    #[arg(long, default_value_t = 180)]
    poll_interval_secs: u64,

    /// Only persist the observed IP after a successful cluster update, so a
    /// failed update is retried on the next tick.
    #[arg(long)]
    persist_only_on_success: bool,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn agent_config(&self, ip_file: &Path) -> AgentConfig {
        AgentConfig {
            cluster: ClusterTarget {
                project: self.project.clone(),
                zone: self.zone.clone(),
                cluster: self.cluster.clone(),
            },
            network_name: self.network_name.clone(),
            ip_source: IpSourceConfig {
                url: self.ip_echo_url.clone(),
            },
            state_store: StateStoreConfig::File {
                path: ip_file.to_string_lossy().into_owned(),
            },
            engine: EngineConfig {
                poll_interval_secs: self.poll_interval_secs,
                persist_on_reconcile_failure: !self.persist_only_on_success,
                ..EngineConfig::default()
            },
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.service_account.as_os_str().is_empty() {
        eprintln!("configuration error: service account path cannot be empty");
        return AgentExitCode::ConfigError.into();
    }

    // Resolve and create the per-user state directory
    let state_dir = match dirs::home_dir() {
        Some(home) => home.join(STATE_DIR_NAME),
        None => {
            eprintln!("configuration error: unable to determine the home directory");
            return AgentExitCode::ConfigError.into();
        }
    };

    if let Err(e) = std::fs::create_dir_all(&state_dir) {
        eprintln!(
            "configuration error: failed to create {}: {e}",
            state_dir.display()
        );
        return AgentExitCode::ConfigError.into();
    }

    let config = args.agent_config(&state_dir.join(IP_FILE_NAME));
    if let Err(e) = config.validate() {
        eprintln!("configuration error: {e}");
        return AgentExitCode::ConfigError.into();
    }

    // Log to stdout and to the append-only file in the state directory
    let log_path = state_dir.join(LOG_FILE_NAME);
    let log_file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!(
                "configuration error: failed to open log file {}: {e}",
                log_path.display()
            );
            return AgentExitCode::ConfigError.into();
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.clone()));

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout.and(Arc::new(log_file)))
        .with_ansi(false)
        .try_init()
    {
        eprintln!("failed to initialize logging: {e}");
        return AgentExitCode::ConfigError.into();
    }

    // Export the credential path for ambient credential lookups. Must happen
    // before the runtime spawns any threads.
    unsafe {
        std::env::set_var("GOOGLE_APPLICATION_CREDENTIALS", &args.service_account);
    }

    info!(
        project = %args.project,
        zone = %args.zone,
        cluster = %args.cluster,
        network_name = %args.network_name,
        "starting authnetd"
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to create tokio runtime: {e}");
            return AgentExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config, &args.service_account).await {
            error!("daemon error: {e:#}");
            AgentExitCode::RuntimeError
        } else {
            AgentExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Wire the components and run the engine until shutdown
async fn run_daemon(config: AgentConfig, credentials: &Path) -> Result<()> {
    let ip_source = HttpIpSource::new(config.ip_source.url.clone())?;
    let cluster = GkeClusterApi::from_credentials_file(credentials, config.cluster.clone())?;

    let state: Box<dyn StateStore> = match &config.state_store {
        StateStoreConfig::File { path } => Box::new(FileStateStore::new(path).await?),
        StateStoreConfig::Memory => Box::new(MemoryStateStore::new()),
    };

    let (engine, mut events) = Engine::new(Box::new(ip_source), Box::new(cluster), state, &config)?;

    // Surface engine events in the logs for observers tailing the file
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            tracing::debug!(?event, "engine event");
        }
    });

    info!("watching public IP, checking every {}s", config.engine.poll_interval_secs);
    engine.run().await?;

    info!("engine stopped");
    Ok(())
}
