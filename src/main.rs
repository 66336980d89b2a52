//! Framesync shell
//!
//! Mirrors the windows of a host compositor and drives them from a single
//! tick loop. Launcher commands are read from stdin.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use framesync::config::Config;
use framesync::shell::{self, ShellInputs, TracingPresenter, launcher};
use framesync::UnixSocketBridge;

/// Command line options
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    socket: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                args.config = Some(iter.next().context("--config needs a path")?.into());
            }
            "--socket" | "-s" => {
                args.socket = Some(iter.next().context("--socket needs a path")?.into());
            }
            other => anyhow::bail!("Unknown argument: {}", other),
        }
    }
    Ok(args)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = parse_args()?;

    // Configuration comes first so its log filter can apply
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(socket) = args.socket {
        config.transport.socket_path = Some(socket);
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.filter.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Framesync shell");

    // Setup signal handlers for graceful shutdown
    let (shutdown_tx, shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);

    // Handle SIGTERM and SIGINT
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let tx = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    let _ = tx.send(()).await;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    let _ = tx.send(()).await;
                }
            }
        });
    }

    let bridge = UnixSocketBridge::new(
        config.transport.resolved_socket_path(),
        config.transport.request_timeout(),
    );
    let mut presenter = TracingPresenter::new();

    // Local pointer input has no source in the headless shell; remote
    // pointer mirroring still arrives through the host replies.
    let (_pointer_tx, pointer_rx) = tokio::sync::mpsc::channel(64);
    let inputs = ShellInputs {
        pointer: pointer_rx,
        launcher: launcher::spawn_stdin_launcher(config.launcher.argv),
    };

    let exit = shell::run(&config, &bridge, &mut presenter, inputs, shutdown_rx).await;
    drop(shutdown_tx);

    let stats = exit.stats;
    if stats.failed > 0 && stats.applied == 0 {
        error!("Host at {:?} never answered ({} failed round trips)", bridge.path(), stats.failed);
    }
    info!(
        "Shell stopped: {} batches sent, {} applied, {} failed, {} windows mirrored, {} reloads",
        stats.sent,
        stats.applied,
        stats.failed,
        exit.engine.store().len(),
        exit.reloads
    );

    Ok(())
}
