//! Shell Module
//!
//! The tick driver. One loop on one thread owns the engine and selects over
//! the tick clock, the outstanding round trip, local pointer input and the
//! launcher.

pub mod launcher;
pub mod render;

use framesync_proto::ProgramCommand;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::batcher::{BatchStats, Batcher};
use crate::bridge::{HostBridge, QueryFuture, TransportError};
use crate::config::Config;
use crate::input::PointerEvent;
use crate::wm::{EngineSignal, MirrorEngine};
pub use render::{FramePresenter, TracingPresenter};

/// Input sources feeding the engine between ticks
pub struct ShellInputs {
    pub pointer: mpsc::Receiver<PointerEvent>,
    pub launcher: mpsc::Receiver<ProgramCommand>,
}

/// State handed back when the driver stops
pub struct ShellExit {
    pub engine: MirrorEngine,
    pub stats: BatchStats,
    pub reloads: u32,
}

/// Run the shell until `shutdown` fires or its sender is dropped
pub async fn run<B, P>(
    config: &Config,
    bridge: &B,
    presenter: &mut P,
    mut inputs: ShellInputs,
    mut shutdown: mpsc::Receiver<()>,
) -> ShellExit
where
    B: HostBridge,
    P: FramePresenter,
{
    let mut engine = MirrorEngine::new(config.engine.clone());
    let mut batcher = Batcher::new(config.transport.render_handshake);
    let mut in_flight: Option<QueryFuture> = None;
    let mut reloads = 0;

    let mut ticker = tokio::time::interval(config.transport.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut pointer_open = true;
    let mut launcher_open = true;

    info!(
        "Starting tick loop at {} Hz",
        config.transport.tick_rate_hz.max(1)
    );

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                info!("Shutdown requested, leaving tick loop");
                break;
            }

            outcome = settle(&mut in_flight), if in_flight.is_some() => {
                in_flight = None;
                batcher.complete(&mut engine, outcome);

                for signal in engine.take_signals() {
                    match signal {
                        EngineSignal::Reload => {
                            info!("Reloading shell state");
                            engine = MirrorEngine::new(config.engine.clone());
                            batcher = Batcher::new(config.transport.render_handshake);
                            presenter.reload();
                            reloads += 1;
                        }
                    }
                }
            }

            _ = ticker.tick() => {
                if let Some(payload) = batcher.begin_tick(&mut engine) {
                    in_flight = Some(bridge.query(payload));
                }
            }

            event = inputs.pointer.recv(), if pointer_open => match event {
                Some(event) => engine.handle_pointer(event),
                None => {
                    debug!("Pointer input closed");
                    pointer_open = false;
                }
            },

            command = inputs.launcher.recv(), if launcher_open => match command {
                Some(command) => engine.run_program(command),
                None => {
                    debug!("Launcher closed");
                    launcher_open = false;
                }
            },
        }

        if let Some(update) = engine.take_frame_update() {
            presenter.present(&update);
        }
    }

    ShellExit {
        engine,
        stats: batcher.stats(),
        reloads,
    }
}

/// Wait for the outstanding round trip
async fn settle(in_flight: &mut Option<QueryFuture>) -> Result<String, TransportError> {
    match in_flight.as_mut() {
        Some(query) => query.await,
        None => std::future::pending().await,
    }
}
