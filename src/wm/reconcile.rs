//! Reconciliation Module
//!
//! Decides what happens to local geometry when the host reports a window.
//! The host is authoritative for name, visibility, kind and decoration; the
//! client is authoritative for geometry once a window is known. A
//! disagreement is re-asserted once; if the host answers that request with
//! its own geometry, the host's value is taken over.

use tracing::debug;

use crate::config::PlacementConfig;
use crate::shared::{Geometry, WindowRecord};

/// Outcome for the geometry part of an inbound `window_map`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryDecision {
    /// New window with an explicit placement: take it as reported
    Adopt(Geometry),
    /// New window without a placement: use this and tell the host
    Place(Geometry),
    /// Host and mirror agree
    Converged,
    /// A gesture owns the geometry; leave it alone
    Defer,
    /// Disagreement, but the local geometry is already on its way
    Await,
    /// Host overrode a request it has already seen: take its geometry
    Accept(Geometry),
    /// Disagreement: send the local geometry again
    Reassert(Geometry),
}

impl GeometryDecision {
    /// Whether this decision queues a corrective `window_map`
    pub fn is_corrective(&self) -> bool {
        matches!(self, GeometryDecision::Place(_) | GeometryDecision::Reassert(_))
    }
}

/// Geometry reconciliation rules
#[derive(Debug, Clone)]
pub struct ReconcilePolicy {
    placement: PlacementConfig,
}

impl ReconcilePolicy {
    pub fn new(placement: PlacementConfig) -> Self {
        Self { placement }
    }

    /// Decide how to treat the reported geometry of a window
    ///
    /// `record` is the current mirror entry, `None` for a window seen for
    /// the first time.
    pub fn decide(
        &self,
        record: Option<&WindowRecord>,
        reported: Geometry,
        visible: bool,
        gesture_active: bool,
    ) -> GeometryDecision {
        let Some(record) = record else {
            // (0, 0) on a visible window means "no placement assigned yet"
            if visible && reported.x == 0 && reported.y == 0 {
                return GeometryDecision::Place(self.default_placement(reported));
            }
            return GeometryDecision::Adopt(reported);
        };

        let local = record.geometry;
        if local == reported {
            return GeometryDecision::Converged;
        }
        if gesture_active {
            debug!("Reconcile: {} is being dragged, keeping local geometry", record.id);
            return GeometryDecision::Defer;
        }
        if record.sync.requested == Some(local) {
            // (0, 0) is the unplaced marker, not an answer to the request
            let unplaced = visible && reported.x == 0 && reported.y == 0;
            if record.sync.requested_sent && !unplaced {
                debug!(
                    "Reconcile: host kept {} at {:?} after seeing {:?}",
                    record.id, reported, local
                );
                return GeometryDecision::Accept(reported);
            }
            return GeometryDecision::Await;
        }
        GeometryDecision::Reassert(local)
    }

    /// Default placement for a window the host has not placed
    ///
    /// The reported size is kept unless it is empty.
    pub fn default_placement(&self, reported: Geometry) -> Geometry {
        let width = if reported.width > 0 {
            reported.width
        } else {
            self.placement.default_width
        };
        let height = if reported.height > 0 {
            reported.height
        } else {
            self.placement.default_height
        };
        Geometry::new(self.placement.default_x, self.placement.default_y, width, height)
    }
}
