//! placerd — the placement service daemon.
//!
//! A control-plane agent that resolves placement criteria to a deployable
//! unit, instantiates it through the orchestration API, polls the
//! instantiation workflow to completion, and starts the install workflow —
//! exposed as a synchronous `POST /deployments` endpoint.
//!
//! # Usage
//!
//! ```text
//! placerd start --config /etc/placer.toml    # detach into the background
//! placerd stop                               # SIGTERM the running daemon
//! placerd run --port 8088                    # foreground, for debugging
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use placer_core::ServiceConfig;
use placer_observe::{EventLog, Level};
use placerd::daemon::{self, DaemonOptions};
use placerd::service;

#[derive(Parser)]
#[command(name = "placerd", about = "Placement service daemon")]
struct Cli {
    /// Path to placer.toml. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detach and run the service in the background.
    Start {
        /// Override the configured listen port.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Signal the running daemon to stop.
    Stop,
    /// Run the service in the foreground (local debugging).
    Run {
        /// Override the configured listen port.
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing. The daemonizer must run before any runtime
    // threads exist, so there is no #[tokio::main] here; the service builds
    // its own runtime.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,placerd=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ServiceConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Start { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            cmd_start(config)
        }
        Command::Stop => cmd_stop(&config),
        Command::Run { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            service::service_main(config)
        }
    }
}

fn cmd_start(config: ServiceConfig) -> anyhow::Result<()> {
    let log = EventLog::open(&config.log_path)?;
    log.append(Level::Info, "starting placement service");

    let opts = DaemonOptions::from_config(&config);
    let service_config = config.clone();
    let handle = daemon::daemonize(&opts, &log, move || service::service_main(service_config))?;

    match handle {
        Some(handle) => {
            std::fs::write(&config.pid_path, format!("{}\n", handle.pid))
                .with_context(|| format!("writing pidfile {}", config.pid_path.display()))?;
            info!(pid = handle.pid, port = handle.listen_port, "placement service started");
            println!("{}", handle.pid);
            Ok(())
        }
        None => {
            // The cause is already in the event log; the invoker just needs
            // to know there is no daemon to manage.
            eprintln!(
                "failed to start placement service: no pid received (see {})",
                config.log_path.display()
            );
            std::process::exit(1);
        }
    }
}

fn cmd_stop(config: &ServiceConfig) -> anyhow::Result<()> {
    let log = EventLog::open(&config.log_path)?;
    let pid_text = std::fs::read_to_string(&config.pid_path)
        .with_context(|| format!("reading pidfile {}", config.pid_path.display()))?;
    let pid: i32 = pid_text
        .trim()
        .parse()
        .context("pidfile does not contain a pid")?;

    info!(pid, "stopping placement service");
    log.append(Level::Info, &format!("stopping process {pid}"));

    match daemon::stop(pid) {
        Ok(()) => {
            let _ = std::fs::remove_file(&config.pid_path);
            Ok(())
        }
        Err(e) => {
            log.append(Level::Error, &format!("kill failed for pid {pid}: {e}"));
            eprintln!("kill failed for pid {pid}: {e}");
            Ok(())
        }
    }
}
