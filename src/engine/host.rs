// src/engine/host.rs

//! Explicit host-thread marshaling.
//!
//! A run-async worker's process phase executes on the background context and
//! must not touch host-exclusive state (UI, project assets) directly. The
//! engine does not marshal automatically; workers dispatch closures to the
//! host loop through this queue at their own call sites.

use tokio::sync::mpsc;
use tracing::debug;

/// A job queued for the host thread.
pub type HostJob = Box<dyn FnOnce() + Send + 'static>;

/// Cloneable sender side; hand one to each worker that needs the host.
#[derive(Debug, Clone)]
pub struct HostDispatcher {
    tx: mpsc::UnboundedSender<HostJob>,
}

impl HostDispatcher {
    /// Queue `job` for the host loop. Returns `false` once the queue side
    /// has been dropped.
    pub fn dispatch(&self, job: impl FnOnce() + Send + 'static) -> bool {
        self.tx.send(Box::new(job)).is_ok()
    }
}

/// Receiving side, drained by the host loop between frames or iterations.
#[derive(Debug)]
pub struct HostQueue {
    rx: mpsc::UnboundedReceiver<HostJob>,
}

/// Create a dispatcher/queue pair.
pub fn channel() -> (HostDispatcher, HostQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (HostDispatcher { tx }, HostQueue { rx })
}

impl HostQueue {
    /// Run every job queued so far without blocking; returns how many ran.
    pub fn drain(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        if ran > 0 {
            debug!(jobs = ran, "host queue drained");
        }
        ran
    }

    /// Await and run jobs until every dispatcher has been dropped.
    pub async fn run_until_closed(mut self) {
        while let Some(job) = self.rx.recv().await {
            job();
        }
        debug!("host queue closed");
    }
}
