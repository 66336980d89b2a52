//! Events Module
//!
//! Handles every inbound reply type. Replies are applied strictly in the
//! order they appear in a batch, so a later message for the same window
//! wins.

use framesync_proto::{Reply, Request, WindowMapReply};
use tracing::{debug, info, warn};

use crate::input::PointerEvent;
use crate::shared::{Geometry, WindowPatch};
use crate::wm::decorations::border_margin;
use crate::wm::reconcile::GeometryDecision;
use crate::wm::store::Upsert;
use crate::wm::{EngineSignal, MirrorEngine};

/// Result of event handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Event was handled successfully
    Handled,
    /// Event should be ignored
    Ignore,
}

impl MirrorEngine {
    /// Apply one inbound reply
    pub fn apply_reply(&mut self, reply: Reply) -> EventResult {
        if let Some(event) = PointerEvent::from_reply(&reply) {
            self.handle_pointer(event);
            return EventResult::Handled;
        }

        match reply {
            Reply::WindowMap(map) => {
                self.handle_window_map(map);
                EventResult::Handled
            }
            Reply::WindowFocus { window } => {
                if !self.store.contains(&window) {
                    debug!("Focus for unknown window {}, ignoring", window);
                    return EventResult::Ignore;
                }
                debug!("Host focused {}", window);
                self.raise(&window);
                EventResult::Handled
            }
            Reply::WindowClose { window } => self.handle_window_close(&window),
            Reply::WindowIcon { window, image } => {
                if !self.store.set_icon(&window, image.clone()) {
                    debug!("Parking icon for unknown window {}", window);
                    self.pending_icons.insert(window, image);
                }
                EventResult::Handled
            }
            Reply::Reload => {
                info!("Host requested reload");
                self.signals.push(EngineSignal::Reload);
                EventResult::Handled
            }
            Reply::RenderReply => {
                self.render_acks += 1;
                EventResult::Handled
            }
            Reply::MouseMove { .. } | Reply::MousePress { .. } => EventResult::Ignore,
            Reply::Unknown => {
                debug!("Ignoring unknown reply");
                EventResult::Ignore
            }
        }
    }

    /// Apply a whole batch in order, then collect closed windows
    pub fn apply_batch(&mut self, replies: Vec<Reply>) {
        for reply in replies {
            self.apply_reply(reply);
        }
        self.collect_garbage();
    }

    fn handle_window_map(&mut self, map: WindowMapReply) {
        let kind = map.kind();
        let reported = Geometry::new(map.x, map.y, map.width, map.height);
        let gesture_active = self.moveresize.is_active(&map.window);
        let decision =
            self.policy
                .decide(self.store.get(&map.window), reported, map.visible, gesture_active);

        let initial = match decision {
            GeometryDecision::Place(placed) => placed,
            _ => reported,
        };
        let created = self.store.upsert(
            &map.window,
            WindowPatch {
                display_name: map.name,
                visible: map.visible,
                kind,
                has_server_border: map.has_border.unwrap_or(false),
                geometry: initial,
            },
        ) == Upsert::Created;

        let window = map.window;
        match decision {
            GeometryDecision::Place(placed) => {
                info!("Window {} has no placement, moving it to {:?}", window, placed);
                self.request_geometry(&window, placed);
            }
            GeometryDecision::Adopt(geometry) => {
                debug!("Window {} mapped at {:?}", window, geometry);
            }
            GeometryDecision::Converged => {
                if let Some(sync) = self.store.sync_mut(&window) {
                    sync.requested = None;
                    sync.requested_sent = false;
                    sync.mismatch_streak = 0;
                    sync.divergence_reported = false;
                }
            }
            GeometryDecision::Defer => {}
            GeometryDecision::Await => self.note_mismatch(&window, reported),
            GeometryDecision::Accept(host) => {
                info!(
                    "Window {}: host overrode the requested geometry, adopting {:?}",
                    window, host
                );
                self.store.set_geometry(&window, host);
                if let Some(sync) = self.store.sync_mut(&window) {
                    sync.requested = None;
                    sync.requested_sent = false;
                }
                self.note_mismatch(&window, reported);
            }
            GeometryDecision::Reassert(local) => {
                debug!("Window {}: host reports {:?}, re-asserting {:?}", window, reported, local);
                self.note_mismatch(&window, reported);
                self.request_geometry(&window, local);
            }
        }

        self.stacking.add_window(&window);
        self.announce_order();
        self.ensure_frame(&window);

        if created {
            if let Some(image) = self.pending_icons.remove(&window) {
                self.store.set_icon(&window, image);
            }
        }
    }

    /// Bind a frame the first time a chromed window is seen
    fn ensure_frame(&mut self, window: &str) {
        let Some(record) = self.store.get(window) else {
            return;
        };
        if !record.kind.is_chromed() || record.frame.is_some() {
            return;
        }
        let has_server_border = record.has_server_border;

        let handle = self.frames.bind(window);
        self.store.set_frame(window, handle);

        if !has_server_border {
            let margin = border_margin(&self.config.frame);
            self.outbox.push(Request::WindowRegisterBorder {
                window: window.to_string(),
                x: margin.x,
                y: margin.y,
                width: margin.width,
                height: margin.height,
            });
        }
    }

    fn note_mismatch(&mut self, window: &str, reported: Geometry) {
        let warn_after = self.config.divergence_warn_after;
        let Some(sync) = self.store.sync_mut(window) else {
            return;
        };
        sync.mismatch_streak = sync.mismatch_streak.saturating_add(1);
        if warn_after > 0 && sync.mismatch_streak >= warn_after && !sync.divergence_reported {
            sync.divergence_reported = true;
            warn!(
                "Window {} geometry has not converged after {} replies (host keeps reporting {:?})",
                window, sync.mismatch_streak, reported
            );
        }
    }

    fn handle_window_close(&mut self, window: &str) -> EventResult {
        if !self.config.collect_closed_windows {
            debug!("Host closed {}, removal disabled", window);
            return EventResult::Ignore;
        }
        if self.store.mark_closing(window) {
            debug!("Host closed {}, scheduled for collection", window);
            EventResult::Handled
        } else {
            EventResult::Ignore
        }
    }
}
