//! Process wiring: builds every subsystem, runs the periodic tasks and the
//! gateway, and shuts them down together.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use hmi_01_uns_registry::{seed_registry, PathRegistry};
use hmi_02_fs_scanner::{DirectoryScanner, RepositoryScanner};
use hmi_03_simulator::{
    spawn_periodic, MetricsSimulator, OperationQueue, RandomSource, RepositoryMonitor,
    ThreadRandomSource,
};
use hmi_04_broker_link::{BrokerLink, ConnectionState, TcpConnector};
use hmi_05_plc_deployment::PlcDeployer;
use hmi_06_api_gateway::{ApiGatewayService, AppState, GatewayMetrics};
use shared_bus::{EventPublisher, InMemoryEventBus};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::RuntimeConfig;
use crate::ingest::spawn_broker_ingest;

/// Grace period for background tasks after the shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// The gateway process.
pub struct HmiRuntime {
    config: RuntimeConfig,
    registry: Arc<PathRegistry>,
    bus: Arc<InMemoryEventBus>,
    scanner: Arc<DirectoryScanner>,
    deployer: Arc<PlcDeployer>,
    metrics: Arc<MetricsSimulator>,
    operations: Arc<OperationQueue>,
    broker: Arc<BrokerLink>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl HmiRuntime {
    /// Build every subsystem. The registry is seeded; nothing is spawned yet.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        Self::with_random_source(config, Arc::new(ThreadRandomSource))
    }

    pub fn with_random_source(config: RuntimeConfig, rng: Arc<dyn RandomSource>) -> Result<Self> {
        config.validate().context("Invalid runtime configuration")?;

        let registry = Arc::new(PathRegistry::new());
        seed_registry(&registry).context("Failed to seed the namespace registry")?;

        let bus = Arc::new(InMemoryEventBus::with_capacity(
            config.gateway.websocket.channel_capacity,
        ));
        let publisher: Arc<dyn EventPublisher> = bus.clone();

        let base = &config.storage.base_path;
        let scanner = Arc::new(
            DirectoryScanner::with_ttl(base, config.storage.scan_ttl)
                .with_max_read_bytes(config.gateway.limits.max_file_read_bytes),
        );
        let deployer = Arc::new(PlcDeployer::new(base));
        let metrics = Arc::new(MetricsSimulator::new(
            registry.clone(),
            publisher.clone(),
            rng.clone(),
        ));
        let operations = Arc::new(OperationQueue::seeded(registry.clone(), publisher, rng));

        let broker_addr = config
            .broker
            .socket_addr()
            .unwrap_or_else(|_| config.broker.url.clone());
        let broker = Arc::new(BrokerLink::new(
            config.broker.clone(),
            Arc::new(TcpConnector::new(broker_addr)),
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            registry,
            bus,
            scanner,
            deployer,
            metrics,
            operations,
            broker,
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn registry(&self) -> Arc<PathRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.bus)
    }

    pub fn broker(&self) -> Arc<BrokerLink> {
        Arc::clone(&self.broker)
    }

    /// Handler state for the gateway.
    pub fn app_state(&self) -> AppState {
        AppState {
            registry: self.registry.clone(),
            scanner: self.scanner.clone(),
            deployer: self.deployer.clone(),
            metrics: self.metrics.clone(),
            operations: self.operations.clone(),
            bus: self.bus.clone(),
            gateway_metrics: Arc::new(GatewayMetrics::new()),
            websocket: self.config.gateway.websocket.clone(),
        }
    }

    /// Deploy artifacts, connect the broker and spawn the periodic tasks.
    ///
    /// ## Startup Sequence
    ///
    /// 1. Write controller artifacts (when enabled)
    /// 2. Connect the broker; failure leaves the link `Degraded`
    /// 3. Spawn metrics, operations and repository monitoring tasks
    /// 4. Spawn broker ingest
    pub async fn start(&self) -> Vec<JoinHandle<()>> {
        info!(
            base = %self.config.storage.base_path.display(),
            "Starting FileSystem HMI runtime"
        );

        if self.config.deployment.enabled {
            let report = self.deployer.deploy_all().await;
            if report.is_complete() {
                info!(deployed = report.deployed.len(), "Controllers deployed");
            } else {
                warn!(
                    deployed = report.deployed.len(),
                    failed = report.failed.len(),
                    "Some controllers failed to deploy"
                );
            }
        }

        let broker_state = self.broker.connect().await;
        if broker_state != ConnectionState::Connected {
            info!(state = ?broker_state, "Running without broker");
        }

        let mut handles = Vec::new();

        let metrics = self.metrics.clone();
        handles.push(spawn_periodic(
            "metrics",
            self.config.simulator.metrics_interval,
            self.shutdown_rx.clone(),
            move || {
                let metrics = metrics.clone();
                async move {
                    metrics.tick().await;
                }
            },
        ));

        let operations = self.operations.clone();
        handles.push(spawn_periodic(
            "operations",
            self.config.simulator.operations_interval,
            self.shutdown_rx.clone(),
            move || {
                let operations = operations.clone();
                async move {
                    operations.advance().await;
                }
            },
        ));

        let mut monitor = RepositoryMonitor::new(
            self.registry.clone(),
            RepositoryScanner::new(&self.config.storage.base_path),
        )
        .with_broker(self.broker.clone());
        if self.config.deployment.enabled {
            monitor = monitor.with_deployer(self.deployer.clone());
        }
        let monitor = Arc::new(monitor);
        handles.push(spawn_periodic(
            "repository",
            self.config.simulator.repository_interval,
            self.shutdown_rx.clone(),
            move || {
                let monitor = monitor.clone();
                async move {
                    monitor.tick(Utc::now()).await;
                }
            },
        ));

        handles.push(spawn_broker_ingest(
            self.broker.subscribe(),
            self.registry.clone(),
            self.bus.clone(),
            self.shutdown_rx.clone(),
        ));

        handles
    }

    /// Signal every task to stop and wait for them within a grace period.
    pub async fn shutdown(&self, handles: Vec<JoinHandle<()>>) {
        info!("Initiating graceful shutdown...");
        if self.shutdown_tx.send(true).is_err() {
            warn!("No task was listening for shutdown");
        }
        self.broker.disconnect();

        let joined = tokio::time::timeout(SHUTDOWN_GRACE, await_all(handles)).await;
        if joined.is_err() {
            warn!("Background tasks did not stop within the grace period");
        }
        info!("Shutdown complete");
    }

    /// Start everything, serve until `signal` resolves or the gateway
    /// fails, then shut down.
    pub async fn run_until(self, signal: impl Future<Output = ()>) -> Result<()> {
        let handles = self.start().await;

        let gateway = ApiGatewayService::new(self.config.gateway.clone(), self.app_state())
            .context("Invalid gateway configuration")?;
        let mut server = tokio::spawn(gateway.run(self.shutdown_rx.clone()));

        let outcome = tokio::select! {
            _ = signal => {
                info!("Received shutdown signal");
                None
            }
            result = &mut server => Some(result),
        };

        self.shutdown(handles).await;

        let result = match outcome {
            Some(result) => result,
            None => server.await,
        };
        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!(error = %e, "API Gateway failed");
                Err(e).context("API Gateway failed")
            }
            Err(e) => Err(e).context("API Gateway task panicked"),
        }
    }
}

async fn await_all(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if let Err(e) = handle.await {
            warn!(error = %e, "Background task ended abnormally");
        }
    }
}
