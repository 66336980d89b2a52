//! Pending outbound queue
//!
//! Requests accumulate here between flushes and leave in the order they
//! were queued; the host processes them in that order.

use framesync_proto::Request;
use tracing::debug;

#[derive(Debug, Default)]
pub struct Outbox {
    queue: Vec<Request>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: Request) {
        debug!("Queued {:?}", request);
        self.queue.push(request);
    }

    /// Take the whole queue, leaving it empty
    pub fn take(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.queue)
    }

    pub fn as_slice(&self) -> &[Request] {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
