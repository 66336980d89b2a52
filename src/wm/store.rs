//! Window State Store
//!
//! The local mirror of host window state. Every mutation of a
//! `WindowRecord` goes through this module, which records which windows
//! changed so presentation can be refreshed once per tick.

use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::shared::window_state::SyncState;
use crate::shared::{Geometry, WindowId, WindowPatch, WindowRecord};
use crate::wm::decorations::FrameHandle;

/// Result of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// First report for this window
    Created,
    /// Known window, server-authoritative fields merged
    Updated,
}

/// Windows changed since the last drain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreChanges {
    pub updated: Vec<WindowId>,
    pub removed: Vec<WindowId>,
}

impl StoreChanges {
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Mapping from window id to record
#[derive(Debug, Default)]
pub struct WindowStore {
    windows: HashMap<WindowId, WindowRecord>,
    dirty: BTreeSet<WindowId>,
    removed: Vec<WindowId>,
}

impl WindowStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or merge a window from a host report
    ///
    /// Known windows take name, visibility, kind and border flag from the
    /// patch. Their geometry is left alone; see `wm::reconcile`.
    pub fn upsert(&mut self, id: &str, patch: WindowPatch) -> Upsert {
        match self.windows.get_mut(id) {
            Some(record) => {
                let before = record.clone();
                if let Some(name) = patch.display_name {
                    record.display_name = name;
                }
                record.visible = patch.visible;
                record.kind = patch.kind;
                record.has_server_border = patch.has_server_border;
                record.sync.closing = false;
                if *record != before {
                    self.dirty.insert(id.to_string());
                }
                Upsert::Updated
            }
            None => {
                debug!("Store: new window {} at {:?}", id, patch.geometry);
                self.windows
                    .insert(id.to_string(), WindowRecord::from_patch(id, patch));
                self.dirty.insert(id.to_string());
                Upsert::Created
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&WindowRecord> {
        self.windows.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.windows.contains_key(id)
    }

    /// Set visibility, returns false for unknown windows
    pub fn set_visible(&mut self, id: &str, visible: bool) -> bool {
        self.modify(id, |record| record.visible = visible)
    }

    /// Replace the local geometry, returns false for unknown windows
    pub fn set_geometry(&mut self, id: &str, geometry: Geometry) -> bool {
        self.modify(id, |record| record.geometry = geometry)
    }

    pub fn set_icon(&mut self, id: &str, image: String) -> bool {
        self.modify(id, |record| record.icon = Some(image))
    }

    pub fn set_frame(&mut self, id: &str, frame: FrameHandle) -> bool {
        self.modify(id, |record| record.frame = Some(frame))
    }

    /// Hide a window the host confirmed closed and queue it for collection
    pub fn mark_closing(&mut self, id: &str) -> bool {
        self.modify(id, |record| {
            record.visible = false;
            record.sync.closing = true;
        })
    }

    /// Windows waiting for collection
    pub fn closing_windows(&self) -> Vec<WindowId> {
        let mut ids: Vec<WindowId> = self
            .windows
            .values()
            .filter(|record| record.sync.closing)
            .map(|record| record.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Drop a record
    ///
    /// Only the collection pass calls this, after checking that no gesture
    /// still references the window.
    pub(crate) fn remove(&mut self, id: &str) -> Option<WindowRecord> {
        let record = self.windows.remove(id)?;
        self.dirty.remove(id);
        self.removed.push(id.to_string());
        Some(record)
    }

    /// Reconciliation bookkeeping, does not mark the window dirty
    pub(crate) fn sync_mut(&mut self, id: &str) -> Option<&mut SyncState> {
        self.windows.get_mut(id).map(|record| &mut record.sync)
    }

    /// Forget every outstanding geometry request
    pub(crate) fn clear_requests(&mut self) {
        for record in self.windows.values_mut() {
            record.sync.requested = None;
            record.sync.requested_sent = false;
        }
    }

    /// Outstanding requests were handed to the transport
    pub(crate) fn mark_requests_sent(&mut self) {
        for record in self.windows.values_mut() {
            if record.sync.requested.is_some() {
                record.sync.requested_sent = true;
            }
        }
    }

    /// All records, in no particular order
    pub fn all(&self) -> impl Iterator<Item = &WindowRecord> {
        self.windows.values()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty() || !self.removed.is_empty()
    }

    /// Drain the change set
    pub fn take_changes(&mut self) -> StoreChanges {
        StoreChanges {
            updated: std::mem::take(&mut self.dirty).into_iter().collect(),
            removed: std::mem::take(&mut self.removed),
        }
    }

    fn modify(&mut self, id: &str, apply: impl FnOnce(&mut WindowRecord)) -> bool {
        let Some(record) = self.windows.get_mut(id) else {
            return false;
        };
        let before = record.clone();
        apply(record);
        if *record != before {
            self.dirty.insert(id.to_string());
        }
        true
    }
}
