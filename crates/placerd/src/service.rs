//! Service entry point — assembles the subsystems and serves the REST API.
//!
//! Runs in the detached daemon (or in the foreground for `run`): builds the
//! tokio runtime, wires config → observability → orchestrator client →
//! placement rule → engine → router, and blocks until the server exits.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::{SignalKind, signal};
use tracing::info;

use placer_api::{ApiState, build_router};
use placer_client::HttpOrchestrator;
use placer_core::ServiceConfig;
use placer_engine::{Engine, EngineConfig};
use placer_observe::{EventLog, Level, ServiceStats};
use placer_resolver::FixedUnitRule;

/// Build a runtime and serve until shutdown. This is the `service_main`
/// handed to the daemonizer; any setup error propagates to the caller,
/// which logs it and exits the process.
pub fn service_main(config: ServiceConfig) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(config))
}

async fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    let log = EventLog::open(&config.log_path)?;
    let stats = Arc::new(ServiceStats::new());

    let orchestrator = HttpOrchestrator::new(
        &config.orchestrator.endpoint,
        &config.orchestrator.username,
        &config.orchestrator.password,
        &config.orchestrator.tenant,
    )?;
    info!(
        endpoint = %config.orchestrator.endpoint,
        tenant = %config.orchestrator.tenant,
        "orchestrator client initialized"
    );

    let rule = FixedUnitRule::new(config.placement.unit.clone());
    let engine_config = EngineConfig {
        poll_attempts: config.poll.attempts,
        poll_interval: Duration::from_secs(config.poll.interval_secs),
        ..EngineConfig::default()
    };
    let engine = Engine::with_config(
        Arc::new(orchestrator),
        Arc::new(rule),
        log.clone(),
        engine_config,
    );
    info!("deployment engine initialized");

    let router = build_router(ApiState {
        engine: Arc::new(engine),
        stats,
        log: log.clone(),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "API server starting");
    log.append(Level::Info, &format!("listening on {addr}"));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(log.clone()))
        .await?;

    log.append(Level::Info, "service stopped");
    info!("service stopped");
    Ok(())
}

async fn shutdown_signal(log: EventLog) {
    let mut sigterm =
        signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = sigterm.recv() => {}
        r = tokio::signal::ctrl_c() => { let _ = r; }
    }
    info!("shutdown signal received");
    log.append(Level::Info, "shutdown signal received");
}
