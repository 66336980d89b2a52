//! Transport batcher
//!
//! Once per tick the whole outbound queue leaves as one batch and exactly
//! one round trip is made. While that round trip is outstanding nothing
//! else is sent; requests queued meanwhile wait for the next tick.

use framesync_proto::{Request, decode_batch, encode_batch};
use tracing::{debug, info, warn};

use crate::bridge::TransportError;
use crate::wm::MirrorEngine;

/// Counters for one batcher lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub sent: u64,
    pub applied: u64,
    pub failed: u64,
    /// Ticks skipped because a round trip was still outstanding
    pub skipped_ticks: u64,
}

#[derive(Debug)]
pub struct Batcher {
    render_handshake: bool,
    /// The host has answered a batch carrying `browser_start`
    started: bool,
    in_flight: bool,
    stats: BatchStats,
}

impl Batcher {
    pub fn new(render_handshake: bool) -> Self {
        Self {
            render_handshake,
            started: false,
            in_flight: false,
            stats: BatchStats::default(),
        }
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Build this tick's batch, `None` while a round trip is outstanding
    ///
    /// The engine's queue is drained into the batch. `browser_start` leads
    /// every batch until one of them has been answered.
    pub fn begin_tick(&mut self, engine: &mut MirrorEngine) -> Option<String> {
        if self.in_flight {
            self.stats.skipped_ticks += 1;
            return None;
        }

        let mut batch = Vec::with_capacity(engine.pending().len() + 2);
        if !self.started {
            batch.push(Request::BrowserStart);
        }
        batch.extend(engine.take_outbound());
        if self.render_handshake {
            batch.push(Request::RenderRequest);
        }
        if batch.is_empty() {
            return None;
        }

        match encode_batch(&batch) {
            Ok(payload) => {
                self.in_flight = true;
                self.stats.sent += 1;
                debug!("Sending batch of {} requests", batch.len());
                Some(payload)
            }
            Err(e) => {
                warn!("Dropping batch of {} requests: {}", batch.len(), e);
                self.stats.failed += 1;
                engine.on_transport_failure();
                None
            }
        }
    }

    /// Apply the outcome of the outstanding round trip
    pub fn complete(&mut self, engine: &mut MirrorEngine, outcome: Result<String, TransportError>) {
        self.in_flight = false;

        let decoded = outcome.and_then(|payload| {
            decode_batch(&payload).map_err(|e| TransportError::Protocol(format!("{:#}", e)))
        });

        match decoded {
            Ok(batch) => {
                if !self.started {
                    info!("Host acknowledged start");
                    self.started = true;
                }
                for error in &batch.skipped {
                    warn!("Skipping malformed reply: {}", error);
                }
                if !batch.replies.is_empty() {
                    debug!("Applying {} replies", batch.replies.len());
                }
                engine.apply_batch(batch.replies);
                self.stats.applied += 1;
            }
            Err(e) => {
                warn!("Round trip failed, batch dropped: {}", e);
                self.stats.failed += 1;
                engine.on_transport_failure();
            }
        }
    }
}
