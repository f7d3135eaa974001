#![allow(dead_code)]

//! Fake workers for exercising the engine without real processes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;
use taskdock::worker::{ProcessFuture, TaskWorker, WorkerContext};

/// Shared phase log filled in by [`ProbeWorker`]s, in call order.
pub type PhaseLog = Arc<Mutex<Vec<String>>>;

pub fn phase_log() -> PhaseLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Worker whose process phase succeeds immediately.
pub struct NoopWorker;

impl TaskWorker for NoopWorker {
    fn process<'a>(&'a mut self, _ctx: &'a mut WorkerContext) -> ProcessFuture<'a> {
        Box::pin(async { Ok(()) })
    }
}

/// Worker that records every phase call into a shared log, with optional
/// injected failures and an optional process delay.
pub struct ProbeWorker {
    tag: String,
    log: PhaseLog,
    fail_preprocess: bool,
    fail_process: bool,
    fail_postprocess: bool,
    panic_process: bool,
    delay: Option<Duration>,
}

impl ProbeWorker {
    pub fn new(tag: &str, log: PhaseLog) -> Self {
        Self {
            tag: tag.to_string(),
            log,
            fail_preprocess: false,
            fail_process: false,
            fail_postprocess: false,
            panic_process: false,
            delay: None,
        }
    }

    pub fn fail_preprocess(mut self) -> Self {
        self.fail_preprocess = true;
        self
    }

    pub fn fail_process(mut self) -> Self {
        self.fail_process = true;
        self
    }

    pub fn fail_postprocess(mut self) -> Self {
        self.fail_postprocess = true;
        self
    }

    pub fn panic_process(mut self) -> Self {
        self.panic_process = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn record(&self, phase: &str) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.tag, phase));
    }
}

impl TaskWorker for ProbeWorker {
    fn preprocess(&mut self, _ctx: &mut WorkerContext) -> anyhow::Result<()> {
        self.record("preprocess");
        if self.fail_preprocess {
            bail!("injected preprocess failure for {}", self.tag);
        }
        Ok(())
    }

    fn process<'a>(&'a mut self, _ctx: &'a mut WorkerContext) -> ProcessFuture<'a> {
        Box::pin(async move {
            self.record("process");
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.panic_process {
                panic!("injected process panic for {}", self.tag);
            }
            if self.fail_process {
                bail!("injected process failure for {}", self.tag);
            }
            Ok(())
        })
    }

    fn postprocess(&mut self, _ctx: &mut WorkerContext) -> anyhow::Result<()> {
        self.record("postprocess");
        if self.fail_postprocess {
            bail!("injected postprocess failure for {}", self.tag);
        }
        Ok(())
    }
}

/// Concurrency gauge shared between [`GaugeWorker`]s of one task.
#[derive(Debug, Default)]
pub struct GaugeState {
    pub active: AtomicUsize,
    pub max_seen: AtomicUsize,
    pub runs: AtomicUsize,
}

/// Worker that tracks how many process phases overlap.
///
/// Holds the process phase open for `hold` so overlaps become observable.
pub struct GaugeWorker {
    state: Arc<GaugeState>,
    hold: Duration,
}

impl GaugeWorker {
    pub fn new(state: Arc<GaugeState>, hold: Duration) -> Self {
        Self { state, hold }
    }
}

impl TaskWorker for GaugeWorker {
    fn process<'a>(&'a mut self, _ctx: &'a mut WorkerContext) -> ProcessFuture<'a> {
        Box::pin(async move {
            let now = self.state.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.state.max_seen.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.hold).await;
            self.state.active.fetch_sub(1, Ordering::SeqCst);
            self.state.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}
