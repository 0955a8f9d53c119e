//! Engine link - hands planning requests to the routing engine off the hot path
//!
//! The planning controller must never block on the engine, so requests go
//! through a bounded channel with `try_send`. A full or closed channel drops
//! the request with a warning; the engine reports the consequences through
//! its normal progress/result callbacks.

use crate::services::engine::{EngineRequest, RouteEngine};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

/// A request waiting for the engine
#[derive(Debug)]
pub struct QueuedRequest {
    pub request: EngineRequest,
    /// When the request was enqueued (for queue delay measurement)
    pub enqueued_at: Instant,
}

/// `RouteEngine` backed by a bounded channel
#[derive(Debug, Clone)]
pub struct EngineLink {
    tx: mpsc::Sender<QueuedRequest>,
}

impl RouteEngine for EngineLink {
    fn submit(&mut self, request: EngineRequest) {
        let kind = request.as_str();
        match self.tx.try_send(QueuedRequest { request, enqueued_at: Instant::now() }) {
            Ok(()) => debug!(request = %kind, "engine_request_queued"),
            Err(TrySendError::Full(_)) => warn!(request = %kind, "engine_request_dropped_full"),
            Err(TrySendError::Closed(_)) => warn!(request = %kind, "engine_request_dropped_closed"),
        }
    }
}

/// Consumes queued requests. Stands in for the engine's request handler
/// when the process runs against a replay feed.
pub struct EngineRequestWorker {
    rx: mpsc::Receiver<QueuedRequest>,
}

impl EngineRequestWorker {
    /// Run until every `EngineLink` is dropped; returns how many requests were seen
    pub async fn run(mut self) -> usize {
        info!("engine_worker_started");
        let mut handled = 0usize;

        while let Some(queued) = self.rx.recv().await {
            let queue_delay_us = queued.enqueued_at.elapsed().as_micros() as u64;
            match &queued.request {
                EngineRequest::Build { start, finish, router } => info!(
                    router = %router.as_str(),
                    start = %start.as_str(),
                    finish = %finish.as_str(),
                    queue_delay_us = %queue_delay_us,
                    "engine_build_requested"
                ),
                EngineRequest::Cancel => {
                    info!(queue_delay_us = %queue_delay_us, "engine_cancel_requested")
                }
            }
            handled += 1;
        }

        info!(handled = %handled, "engine_worker_stopped");
        handled
    }
}

/// Create the engine link and its worker
///
/// Returns the link (for the planning controller) and the worker (to be spawned)
pub fn create_engine_link(buffer_size: usize) -> (EngineLink, EngineRequestWorker) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (EngineLink { tx }, EngineRequestWorker { rx })
}
