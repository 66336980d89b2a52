//! End-to-end mirror scenarios against a scripted host

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use framesync::bridge::{HostBridge, QueryFuture, TransportError};
use framesync::config::{Config, EngineConfig};
use framesync::shared::Geometry;
use framesync::shell::{self, FramePresenter, ShellInputs};
use framesync::wm::FrameUpdate;
use framesync::{Batcher, MirrorEngine, PointerEvent};
use framesync_proto::{ProgramCommand, Request};
use tokio::sync::mpsc;

const UNPLACED_W1: &str = r#"[{"t":"window_map","window":"w1","x":0,"y":0,"width":500,"height":500,"visible":true,"win_t":"WINDOW_TYPE_NORMAL"}]"#;

/// Host that answers from a script, then with empty batches
#[derive(Default)]
struct ScriptedBridge {
    script: Mutex<VecDeque<Result<String, TransportError>>>,
    sent: Mutex<Vec<String>>,
}

impl ScriptedBridge {
    fn new(script: Vec<Result<String, TransportError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<Vec<Request>> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|payload| serde_json::from_str(payload).unwrap())
            .collect()
    }
}

impl HostBridge for ScriptedBridge {
    fn query(&self, request: String) -> QueryFuture {
        self.sent.lock().unwrap().push(request);
        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("[]".to_string()));
        Box::pin(async move { reply })
    }
}

#[derive(Default)]
struct RecordingPresenter {
    updates: Vec<FrameUpdate>,
    reloads: u32,
}

impl FramePresenter for RecordingPresenter {
    fn present(&mut self, update: &FrameUpdate) {
        self.updates.push(update.clone());
    }

    fn reload(&mut self) {
        self.reloads += 1;
    }
}

fn fast_config() -> Config {
    let mut config = Config::default();
    config.transport.tick_rate_hz = 1000;
    config
}

fn window_maps(batch: &[Request]) -> Vec<(String, Geometry)> {
    batch
        .iter()
        .filter_map(|request| match request {
            Request::WindowMap {
                window,
                x,
                y,
                width,
                height,
            } => Some((window.clone(), Geometry::new(*x, *y, *width, *height))),
            _ => None,
        })
        .collect()
}

/// Run the driver for `duration`, then shut it down
async fn run_for(
    bridge: &ScriptedBridge,
    presenter: &mut RecordingPresenter,
    pointer: Vec<PointerEvent>,
    launcher: Vec<ProgramCommand>,
    duration: Duration,
) -> shell::ShellExit {
    let config = fast_config();
    let (pointer_tx, pointer_rx) = mpsc::channel(64);
    let (launcher_tx, launcher_rx) = mpsc::channel(16);
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let inputs = ShellInputs {
        pointer: pointer_rx,
        launcher: launcher_rx,
    };

    let driver = shell::run(&config, bridge, presenter, inputs, shutdown_rx);
    let feeder = async move {
        // Let the first batches land before injecting input
        tokio::time::sleep(duration / 2).await;
        for event in pointer {
            pointer_tx.send(event).await.unwrap();
        }
        for command in launcher {
            launcher_tx.send(command).await.unwrap();
        }
        tokio::time::sleep(duration / 2).await;
        shutdown_tx.send(()).await.unwrap();
    };

    let (exit, ()) = tokio::join!(driver, feeder);
    exit
}

#[test]
fn test_unplaced_window_scenario() {
    let mut engine = MirrorEngine::new(EngineConfig::default());
    let mut batcher = Batcher::new(true);

    let first = batcher.begin_tick(&mut engine).unwrap();
    assert!(first.starts_with(r#"[{"t":"browser_start"}"#));
    batcher.complete(&mut engine, Ok(UNPLACED_W1.to_string()));

    let record = engine.window("w1").unwrap();
    assert_eq!(record.geometry, Geometry::new(100, 100, 500, 500));
    assert_eq!(engine.stacking().stacking_order(), ["w1".to_string()]);
    assert_eq!(
        window_maps(engine.pending()),
        vec![("w1".to_string(), Geometry::new(100, 100, 500, 500))]
    );

    // The corrective request leaves on the next tick, without browser_start
    let second: Vec<Request> =
        serde_json::from_str(&batcher.begin_tick(&mut engine).unwrap()).unwrap();
    assert!(matches!(second[0], Request::WindowMap { .. }));
    assert!(!second.contains(&Request::BrowserStart));
    assert_eq!(second.last(), Some(&Request::RenderRequest));

    // Host agrees: nothing further to correct
    batcher.complete(
        &mut engine,
        Ok(r#"[{"t":"window_map","window":"w1","x":100,"y":100,"width":500,"height":500,"visible":true}]"#.into()),
    );
    assert!(window_maps(engine.pending()).is_empty());
}

#[test]
fn test_same_batch_twice_adds_no_correction() {
    let mut engine = MirrorEngine::new(EngineConfig::default());
    let mut batcher = Batcher::new(false);

    batcher.begin_tick(&mut engine);
    batcher.complete(&mut engine, Ok(UNPLACED_W1.to_string()));
    batcher.begin_tick(&mut engine);
    batcher.complete(&mut engine, Ok(UNPLACED_W1.to_string()));

    assert!(window_maps(engine.pending()).is_empty());
    assert_eq!(
        engine.window("w1").unwrap().geometry,
        Geometry::new(100, 100, 500, 500)
    );
}

#[test]
fn test_later_message_in_batch_wins() {
    let mut engine = MirrorEngine::new(EngineConfig::default());
    let mut batcher = Batcher::new(false);
    batcher.begin_tick(&mut engine);

    batcher.complete(
        &mut engine,
        Ok(r#"[
            {"t":"window_map","window":"w1","name":"first","x":10,"y":40,"width":300,"height":200,"visible":true},
            {"t":"window_map","window":"w1","name":"second","x":10,"y":40,"width":300,"height":200,"visible":false},
            {"t":"some_future_tag","payload":1}
        ]"#
        .into()),
    );

    let record = engine.window("w1").unwrap();
    assert_eq!(record.display_name, "second");
    assert!(!record.visible);
}

#[tokio::test]
async fn test_driver_applies_correction_and_presents() {
    let bridge = ScriptedBridge::new(vec![Ok(UNPLACED_W1.to_string())]);
    let mut presenter = RecordingPresenter::default();

    let exit = run_for(&bridge, &mut presenter, vec![], vec![], Duration::from_millis(100)).await;

    let sent = bridge.sent();
    assert!(sent.len() >= 2);
    assert_eq!(sent[0], vec![Request::BrowserStart, Request::RenderRequest]);
    assert_eq!(
        window_maps(&sent[1]),
        vec![("w1".to_string(), Geometry::new(100, 100, 500, 500))]
    );
    assert!(sent[1].contains(&Request::WindowReorder {
        windows: vec!["w1".into()]
    }));
    assert!(sent[2..].iter().all(|batch| !batch.contains(&Request::BrowserStart)));

    let last = presenter.updates.last().unwrap();
    assert_eq!(last.frames.len(), 1);
    assert_eq!(last.frames[0].z_index, 1);
    assert_eq!(exit.engine.store().len(), 1);
    assert_eq!(exit.stats.failed, 0);
}

#[tokio::test]
async fn test_driver_forwards_pointer_and_launcher_input() {
    let bridge = ScriptedBridge::new(vec![Ok(UNPLACED_W1.to_string())]);
    let mut presenter = RecordingPresenter::default();

    // Title bar of w1 at (100, 100) spans y 80..100
    let pointer = vec![
        PointerEvent::Press { x: 200, y: 90 },
        PointerEvent::Move { x: 230, y: 130 },
        PointerEvent::Release { x: 230, y: 130 },
    ];
    let launcher = vec![ProgramCommand::Argv(vec!["xterm".into()])];

    let exit = run_for(&bridge, &mut presenter, pointer, launcher, Duration::from_millis(200)).await;

    assert_eq!(
        exit.engine.window("w1").unwrap().geometry,
        Geometry::new(130, 140, 500, 500)
    );
    let sent: Vec<Request> = bridge.sent().into_iter().flatten().collect();
    assert!(sent.contains(&Request::WindowFocus {
        window: "w1".into()
    }));
    assert!(sent.contains(&Request::RunProgram {
        command: ProgramCommand::Argv(vec!["xterm".into()])
    }));
    assert!(window_maps(&sent).contains(&("w1".to_string(), Geometry::new(130, 140, 500, 500))));
}

#[tokio::test]
async fn test_driver_survives_failures_and_reload() {
    let bridge = ScriptedBridge::new(vec![
        Err(TransportError::Closed),
        Ok(UNPLACED_W1.to_string()),
        Ok(r#"[{"t":"reload"}]"#.to_string()),
    ]);
    let mut presenter = RecordingPresenter::default();

    let exit = run_for(&bridge, &mut presenter, vec![], vec![], Duration::from_millis(100)).await;

    let sent = bridge.sent();
    // Failed start is repeated, reload starts over
    assert_eq!(sent[0][0], Request::BrowserStart);
    assert_eq!(sent[1][0], Request::BrowserStart);
    assert_eq!(sent[3][0], Request::BrowserStart);
    assert_eq!(exit.reloads, 1);
    assert_eq!(presenter.reloads, 1);
    assert!(exit.engine.store().is_empty());
}
