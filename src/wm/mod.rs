//! Window Manager Module
//!
//! The mirror engine: local window state, z-order, interactions and the
//! outbound queue, all owned by one `MirrorEngine` that the batcher drives
//! once per tick.

pub mod decorations;
pub mod events;
pub mod moveresize;
pub mod outbox;
pub mod reconcile;
pub mod stacking;
pub mod store;

use framesync_proto::{ProgramCommand, Request};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::shared::{Geometry, WindowId, WindowRecord};
use decorations::{FrameArena, FrameControl, FrameView, HitTarget};
use moveresize::{MoveResizeManager, MoveResizeOperation};
use outbox::Outbox;
use reconcile::ReconcilePolicy;
use stacking::StackingManager;
use store::WindowStore;

pub use events::EventResult;

/// Requests from the engine to whoever drives it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineSignal {
    /// Host asked for a full UI reload
    Reload,
}

/// Frames to redraw after a tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameUpdate {
    /// Every live frame, bottom to top
    pub frames: Vec<FrameView>,
    /// Windows collected since the previous update
    pub removed: Vec<WindowId>,
}

pub struct MirrorEngine {
    config: EngineConfig,
    store: WindowStore,
    stacking: StackingManager,
    frames: FrameArena,
    moveresize: MoveResizeManager,
    policy: ReconcilePolicy,
    outbox: Outbox,

    /// Icons that arrived before their window
    pending_icons: HashMap<WindowId, String>,

    signals: Vec<EngineSignal>,

    /// Z-order changed since the last frame update
    restacked: bool,

    render_acks: u64,

    /// Last known pointer position (root coordinates)
    pointer: (i32, i32),
}

impl MirrorEngine {
    /// Create an engine with an empty mirror
    pub fn new(config: EngineConfig) -> Self {
        info!(
            "Initializing mirror engine (min_size={}, border_width={})",
            config.min_size, config.frame.border_width
        );
        Self {
            store: WindowStore::new(),
            stacking: StackingManager::new(),
            frames: FrameArena::new(),
            moveresize: MoveResizeManager::new(config.min_size, config.frame.border_width),
            policy: ReconcilePolicy::new(config.placement.clone()),
            outbox: Outbox::new(),
            pending_icons: HashMap::new(),
            signals: Vec::new(),
            restacked: false,
            render_acks: 0,
            pointer: (0, 0),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &WindowStore {
        &self.store
    }

    pub fn window(&self, id: &str) -> Option<&WindowRecord> {
        self.store.get(id)
    }

    pub fn stacking(&self) -> &StackingManager {
        &self.stacking
    }

    pub fn frames(&self) -> &FrameArena {
        &self.frames
    }

    pub fn interactions(&self) -> &MoveResizeManager {
        &self.moveresize
    }

    /// Requests queued for the next flush
    pub fn pending(&self) -> &[Request] {
        self.outbox.as_slice()
    }

    /// Number of `render_reply` acknowledgements received
    pub fn render_acks(&self) -> u64 {
        self.render_acks
    }

    pub fn pointer_position(&self) -> (i32, i32) {
        self.pointer
    }

    // ------------------------------------------------------------------
    // Z-order
    // ------------------------------------------------------------------

    /// Raise a window and announce the new order if it changed
    pub fn raise(&mut self, window: &str) {
        self.stacking.raise_window(window);
        self.announce_order();
    }

    /// Raise a window and ask the host to focus it
    pub fn focus(&mut self, window: &str) {
        self.raise(window);
        self.outbox.push(Request::WindowFocus {
            window: window.to_string(),
        });
    }

    /// Queue the complete order after any change to it
    fn announce_order(&mut self) {
        if self.stacking.take_changed() {
            self.restacked = true;
            self.outbox.push(Request::WindowReorder {
                windows: self.stacking.stacking_order().to_vec(),
            });
        }
    }

    // ------------------------------------------------------------------
    // Interaction
    // ------------------------------------------------------------------

    /// Pointer pressed on part of a frame
    pub fn pointer_down(&mut self, window: &str, target: HitTarget, x: i32, y: i32) {
        self.pointer = (x, y);
        let Some(geometry) = self.store.get(window).map(|record| record.geometry) else {
            debug!("Pointer down on unknown window {}", window);
            return;
        };

        // Any press on a frame raises it, controls included
        match target {
            HitTarget::Control(FrameControl::Maximize) => {
                self.focus(window);
                self.toggle_maximize(window);
            }
            HitTarget::Control(FrameControl::Close) => {
                self.focus(window);
                self.close(window);
            }
            HitTarget::TitleBar => {
                self.focus(window);
                self.moveresize.start_move(window, x, y, geometry);
            }
            HitTarget::Resize(direction) => {
                self.focus(window);
                self.moveresize.start_resize(window, direction, x, y, geometry);
            }
            HitTarget::Body => self.focus(window),
        }
    }

    /// Pointer moved; every active gesture follows it
    pub fn pointer_move(&mut self, x: i32, y: i32) {
        self.pointer = (x, y);
        for motion in self.moveresize.handle_motion(x, y) {
            self.apply_local_geometry(&motion.window, motion.geometry);
        }
    }

    /// Pointer released; ends every active gesture
    pub fn pointer_up(&mut self, x: i32, y: i32) {
        self.pointer = (x, y);
        for finished in self.moveresize.finish() {
            if finished.moved && finished.operation == MoveResizeOperation::Move {
                self.focus(&finished.window);
            }
        }
    }

    /// Maximize a window, or restore it when already maximized
    pub fn toggle_maximize(&mut self, window: &str) {
        let Some(current) = self.store.get(window).map(|record| record.geometry) else {
            return;
        };
        let target = self
            .moveresize
            .toggle_maximize(window, current, &self.config.screen);
        self.apply_local_geometry(window, target);
    }

    /// Ask the host to close a window and hide it right away
    pub fn close(&mut self, window: &str) -> bool {
        if !self.store.contains(window) {
            return false;
        }
        info!("Closing window {}", window);
        self.outbox.push(Request::WindowClose {
            window: window.to_string(),
        });
        self.store.set_visible(window, false);
        self.moveresize.forget(window);
        true
    }

    /// Queue a program launch on the host
    pub fn run_program(&mut self, command: ProgramCommand) {
        info!("Launching {:?}", command);
        self.outbox.push(Request::RunProgram { command });
    }

    /// Optimistic geometry change from a user gesture
    fn apply_local_geometry(&mut self, window: &str, geometry: Geometry) {
        if !self.store.set_geometry(window, geometry) {
            return;
        }
        if let Some(sync) = self.store.sync_mut(window) {
            sync.mismatch_streak = 0;
            sync.divergence_reported = false;
        }
        self.request_geometry(window, geometry);
    }

    /// Queue a `window_map` and remember it as the outstanding request
    fn request_geometry(&mut self, window: &str, geometry: Geometry) {
        if let Some(sync) = self.store.sync_mut(window) {
            sync.requested = Some(geometry);
            sync.requested_sent = false;
        }
        self.outbox.push(Request::WindowMap {
            window: window.to_string(),
            x: geometry.x,
            y: geometry.y,
            width: geometry.width,
            height: geometry.height,
        });
    }

    /// Topmost visible frame part under a point
    pub fn hit_test(&self, x: i32, y: i32) -> Option<(WindowId, HitTarget)> {
        self.stacking.topmost_first().find_map(|id| {
            let record = self.store.get(id)?;
            if !record.visible || record.frame.is_none() {
                return None;
            }
            decorations::hit_test_frame(record.geometry, &self.config.frame, x, y)
                .map(|target| (id.clone(), target))
        })
    }

    // ------------------------------------------------------------------
    // Tick plumbing
    // ------------------------------------------------------------------

    /// Take everything queued since the last flush
    pub fn take_outbound(&mut self) -> Vec<Request> {
        self.store.mark_requests_sent();
        self.outbox.take()
    }

    /// A batch was lost; the queue and outstanding geometry requests are void
    ///
    /// Geometry is re-asserted from the next host report.
    pub fn on_transport_failure(&mut self) {
        let dropped = self.outbox.take();
        debug!(
            "Transport failure: dropping {} queued requests and outstanding geometry requests",
            dropped.len()
        );
        self.store.clear_requests();
    }

    /// Remove windows the host closed that nothing references any more
    pub fn collect_garbage(&mut self) -> usize {
        if !self.config.collect_closed_windows {
            return 0;
        }

        let mut collected = 0;
        for id in self.store.closing_windows() {
            if self.moveresize.is_active(&id) {
                debug!("Deferring collection of {}: gesture in progress", id);
                continue;
            }
            let Some(record) = self.store.remove(&id) else {
                continue;
            };
            if let Some(handle) = record.frame {
                self.frames.release(handle);
            }
            self.moveresize.forget(&id);
            self.stacking.remove_window(&id);
            self.pending_icons.remove(&id);
            info!("Collected closed window {}", id);
            collected += 1;
        }

        self.announce_order();
        collected
    }

    /// Frames to redraw, `None` when nothing changed since the last call
    pub fn take_frame_update(&mut self) -> Option<FrameUpdate> {
        let restacked = std::mem::take(&mut self.restacked);
        let phases_changed = self.moveresize.take_changed();
        if !restacked && !phases_changed && !self.store.is_dirty() {
            return None;
        }

        let changes = self.store.take_changes();
        let frames = self
            .stacking
            .stacking_order()
            .iter()
            .filter_map(|id| self.frame_view(id))
            .collect();

        Some(FrameUpdate {
            frames,
            removed: changes.removed,
        })
    }

    fn frame_view(&self, id: &str) -> Option<FrameView> {
        let record = self.store.get(id)?;
        let handle = record.frame?;
        self.frames.resolve(handle)?;
        Some(FrameView {
            handle,
            window: record.id.clone(),
            title: record.display_name.clone(),
            geometry: record.geometry,
            visible: record.visible,
            z_index: self.stacking.stacking_index(id).unwrap_or(0),
            icon: record.icon.clone(),
            phase: self.moveresize.phase(id),
        })
    }

    /// Drain raised signals
    pub fn take_signals(&mut self) -> Vec<EngineSignal> {
        std::mem::take(&mut self.signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use framesync_proto::{Reply, WindowKind, WindowMapReply};

    fn map(window: &str, x: i32, y: i32, width: i32, height: i32) -> Reply {
        Reply::WindowMap(WindowMapReply {
            window: window.into(),
            name: None,
            visible: true,
            x,
            y,
            width,
            height,
            has_border: None,
            win_t: Some(WindowKind::Normal),
        })
    }

    /// Engine with `w1` at (100, 100, 400, 300) and the outbox drained
    fn engine_with_window() -> MirrorEngine {
        let mut engine = MirrorEngine::new(EngineConfig::default());
        engine.apply_reply(map("w1", 100, 100, 400, 300));
        engine.take_outbound();
        engine
    }

    fn maps(requests: &[Request]) -> Vec<Geometry> {
        requests
            .iter()
            .filter_map(|request| match request {
                Request::WindowMap {
                    x,
                    y,
                    width,
                    height,
                    ..
                } => Some(Geometry::new(*x, *y, *width, *height)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_title_bar_drag_moves_and_requests_every_step() {
        let mut engine = engine_with_window();

        engine.pointer_down("w1", HitTarget::TitleBar, 150, 90);
        engine.pointer_move(160, 95);
        engine.pointer_move(170, 100);

        assert_eq!(engine.window("w1").unwrap().geometry, Geometry::new(120, 110, 400, 300));
        assert_eq!(
            maps(engine.pending()),
            vec![Geometry::new(110, 105, 400, 300), Geometry::new(120, 110, 400, 300)]
        );
    }

    #[test]
    fn test_release_after_move_reaffirms_focus() {
        let mut engine = engine_with_window();
        engine.pointer_down("w1", HitTarget::TitleBar, 150, 90);
        engine.pointer_move(160, 95);
        engine.take_outbound();

        engine.pointer_up(160, 95);

        assert_eq!(
            engine.take_outbound(),
            vec![Request::WindowFocus {
                window: "w1".into()
            }]
        );
    }

    #[test]
    fn test_click_without_motion_does_not_refocus_on_release() {
        let mut engine = engine_with_window();
        engine.pointer_down("w1", HitTarget::TitleBar, 150, 90);
        engine.take_outbound();

        engine.pointer_up(150, 90);

        assert!(engine.pending().is_empty());
    }

    #[test]
    fn test_pointer_down_raises_and_reorders() {
        let mut engine = MirrorEngine::new(EngineConfig::default());
        engine.apply_reply(map("a", 10, 10, 100, 100));
        engine.apply_reply(map("b", 300, 10, 100, 100));
        engine.take_outbound();

        engine.pointer_down("a", HitTarget::Body, 50, 50);

        assert_eq!(
            engine.take_outbound(),
            vec![
                Request::WindowReorder {
                    windows: vec!["b".into(), "a".into()]
                },
                Request::WindowFocus { window: "a".into() },
            ]
        );
        assert_eq!(engine.stacking().stacking_index("a"), Some(2));
    }

    #[test]
    fn test_maximize_button_raises_window() {
        let mut engine = MirrorEngine::new(EngineConfig::default());
        engine.apply_reply(map("a", 10, 10, 100, 100));
        engine.apply_reply(map("b", 300, 10, 100, 100));
        engine.take_outbound();

        engine.pointer_down("a", HitTarget::Control(FrameControl::Maximize), 90, 0);

        assert_eq!(
            engine.take_outbound(),
            vec![
                Request::WindowReorder {
                    windows: vec!["b".into(), "a".into()]
                },
                Request::WindowFocus { window: "a".into() },
                Request::WindowMap {
                    window: "a".into(),
                    x: 0,
                    y: 20,
                    width: 1920,
                    height: 1060
                },
            ]
        );
        assert_eq!(engine.stacking().stacking_order(), ["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_close_button_raises_before_closing() {
        let mut engine = MirrorEngine::new(EngineConfig::default());
        engine.apply_reply(map("a", 10, 10, 100, 100));
        engine.apply_reply(map("b", 300, 10, 100, 100));
        engine.take_outbound();

        engine.pointer_down("a", HitTarget::Control(FrameControl::Close), 100, 0);

        let outbound = engine.take_outbound();
        assert_eq!(
            outbound[0],
            Request::WindowReorder {
                windows: vec!["b".into(), "a".into()]
            }
        );
        assert_eq!(outbound.last(), Some(&Request::WindowClose { window: "a".into() }));
    }

    #[test]
    fn test_close_hides_immediately() {
        let mut engine = engine_with_window();

        engine.pointer_down("w1", HitTarget::Control(FrameControl::Close), 0, 0);

        assert!(!engine.window("w1").unwrap().visible);
        assert_eq!(
            engine.take_outbound(),
            vec![
                Request::WindowFocus { window: "w1".into() },
                Request::WindowClose {
                    window: "w1".into()
                },
            ]
        );
        assert!(engine.hit_test(200, 200).is_none());
    }

    #[test]
    fn test_maximize_then_drag_uses_restored_size() {
        let mut engine = engine_with_window();

        engine.pointer_down("w1", HitTarget::Control(FrameControl::Maximize), 0, 0);
        assert_eq!(engine.window("w1").unwrap().geometry, Geometry::new(0, 20, 1920, 1060));

        engine.pointer_down("w1", HitTarget::TitleBar, 900, 10);
        engine.pointer_move(910, 30);

        assert_eq!(engine.window("w1").unwrap().geometry, Geometry::new(110, 120, 400, 300));
        assert_eq!(
            engine.interactions().phase("w1"),
            moveresize::InteractionPhase::Moving
        );
    }

    #[test]
    fn test_resize_gesture_through_engine() {
        let mut engine = engine_with_window();

        engine.pointer_down("w1", HitTarget::Resize(moveresize::ResizeDirection::West), 98, 200);
        engine.pointer_move(138, 200);
        engine.pointer_up(138, 200);

        assert_eq!(engine.window("w1").unwrap().geometry, Geometry::new(140, 100, 360, 300));
        assert!(!engine.interactions().is_active("w1"));
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let mut engine = MirrorEngine::new(EngineConfig::default());
        engine.apply_reply(map("below", 100, 100, 400, 300));
        engine.apply_reply(map("above", 200, 200, 400, 300));

        assert_eq!(engine.hit_test(300, 300), Some(("above".into(), HitTarget::Body)));
        assert_eq!(engine.hit_test(150, 150), Some(("below".into(), HitTarget::Body)));

        engine.raise("below");
        assert_eq!(engine.hit_test(300, 300), Some(("below".into(), HitTarget::Body)));
    }

    #[test]
    fn test_frame_update_only_when_dirty() {
        let mut engine = engine_with_window();

        let update = engine.take_frame_update().unwrap();
        assert_eq!(update.frames.len(), 1);
        assert_eq!(update.frames[0].z_index, 1);
        assert!(engine.take_frame_update().is_none());

        engine.pointer_down("w1", HitTarget::TitleBar, 150, 90);
        let update = engine.take_frame_update().unwrap();
        assert_eq!(update.frames[0].phase, moveresize::InteractionPhase::Moving);
    }

    #[test]
    fn test_run_program_is_queued() {
        let mut engine = MirrorEngine::new(EngineConfig::default());

        engine.run_program(ProgramCommand::Line("xterm".into()));

        assert_eq!(
            engine.take_outbound(),
            vec![Request::RunProgram {
                command: ProgramCommand::Line("xterm".into())
            }]
        );
    }
}
