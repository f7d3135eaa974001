// src/engine/execute.rs

//! The execute path: one worker's three-phase lifecycle against a fresh
//! Report, plus the singleton in-flight gate.

use std::panic::AssertUnwindSafe;
use std::sync::PoisonError;

use futures::FutureExt;
use tokio::sync::{OwnedMutexGuard, watch};
use tracing::{debug, error, info, warn};

use crate::engine::{CancelToken, Engine};
use crate::meta::TaskId;
use crate::report::{Report, TaskResult};
use crate::worker::{WorkerContext, WorkerHandle, WorkerInstance};

/// Removes the singleton in-flight entry when the owning execute finishes,
/// including when its future is dropped or a worker phase panics. Dropping
/// the paired watch sender closes the channel, so joiners fail over instead
/// of waiting on a dead entry.
struct InflightGate<'a> {
    engine: &'a Engine,
    id: TaskId,
}

impl Drop for InflightGate<'_> {
    fn drop(&mut self) {
        self.engine
            .inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

impl Engine {
    /// Run one worker's lifecycle and return its Report.
    ///
    /// Task faults never escape this call: preprocess/process errors and
    /// panics are captured into the Report, postprocess errors are logged
    /// only.
    pub async fn execute(&self, handle: &WorkerHandle) -> Report {
        self.execute_inner(handle, CancelToken::new(), false).await
    }

    /// Like [`execute`](Engine::execute) with an explicit cancellation
    /// token. Cancellation is cooperative: workers poll the token between
    /// sub-steps and the run completes with result Canceled.
    pub async fn execute_with(&self, handle: &WorkerHandle, cancel: CancelToken) -> Report {
        self.execute_inner(handle, cancel, false).await
    }

    pub(crate) async fn execute_inner(
        &self,
        handle: &WorkerHandle,
        cancel: CancelToken,
        batch: bool,
    ) -> Report {
        if !handle.meta().singleton {
            return self.run_lifecycle(handle, cancel, batch).await;
        }

        let id = handle.meta().id.clone();

        // Singleton gate: a second execute for an in-flight identity joins
        // the running execution and receives the same Report instead of
        // starting a duplicate lifecycle.
        let tx = {
            let mut inflight = self
                .inflight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match inflight.get(&id) {
                Some(rx) => {
                    let mut rx = rx.clone();
                    drop(inflight);
                    debug!(task = %id, "joining in-flight singleton execution");
                    return match rx.wait_for(Option::is_some).await {
                        Ok(report) => match report.as_ref() {
                            Some(report) => report.clone(),
                            None => aborted_report(),
                        },
                        Err(_) => aborted_report(),
                    };
                }
                None => {
                    let (tx, rx) = watch::channel(None);
                    inflight.insert(id.clone(), rx);
                    tx
                }
            }
        };

        let _gate = InflightGate { engine: self, id };

        let report = self.run_lifecycle(handle, cancel, batch).await;
        let _ = tx.send(Some(report.clone()));
        report
    }

    async fn run_lifecycle(
        &self,
        handle: &WorkerHandle,
        cancel: CancelToken,
        batch: bool,
    ) -> Report {
        let mut guard = handle.inner.clone().lock_owned().await;
        let mut ctx = WorkerContext {
            report: Report::started(),
            params: guard.params.clone(),
            batch: batch || guard.batch,
            cancel,
        };

        debug!(worker = %guard.id, "preprocess");
        match std::panic::catch_unwind(AssertUnwindSafe(|| guard.worker.preprocess(&mut ctx))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(worker = %guard.id, error = %err, "preprocess failed");
                ctx.report.fail(err.to_string());
            }
            Err(payload) => {
                error!(worker = %guard.id, "preprocess panicked");
                ctx.report
                    .fail(format!("preprocess panicked: {}", panic_message(&*payload)));
            }
        }

        if ctx.report.result == TaskResult::Succeeded {
            if ctx.cancel.is_canceled() {
                ctx.report.cancel();
            } else if handle.meta().run_async {
                (guard, ctx) = self.process_in_background(handle, guard, ctx).await;
            } else {
                debug!(worker = %guard.id, "process (inline)");
                match AssertUnwindSafe(guard.worker.process(&mut ctx))
                    .catch_unwind()
                    .await
                {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => ctx.report.fail(err.to_string()),
                    Err(payload) => {
                        error!(worker = %guard.id, "process panicked");
                        ctx.report
                            .fail(format!("process panicked: {}", panic_message(&*payload)));
                    }
                }
                if ctx.cancel.is_canceled() {
                    ctx.report.cancel();
                }
            }
        }

        debug!(worker = %guard.id, "postprocess");
        match std::panic::catch_unwind(AssertUnwindSafe(|| guard.worker.postprocess(&mut ctx))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(worker = %guard.id, error = %err, "postprocess failed");
                if ctx.report.result == TaskResult::Succeeded {
                    ctx.report.fail(err.to_string());
                }
            }
            Err(payload) => {
                error!(worker = %guard.id, "postprocess panicked");
                if ctx.report.result == TaskResult::Succeeded {
                    ctx.report
                        .fail(format!("postprocess panicked: {}", panic_message(&*payload)));
                }
            }
        }

        ctx.report.finish();
        info!(
            worker = %guard.id,
            result = ?ctx.report.result,
            elapsed_ms = ctx.report.elapsed().num_milliseconds(),
            "execute finished"
        );
        ctx.report
    }

    /// Run the process phase on the background execution context.
    ///
    /// The owned instance lock and context move into the spawned task and
    /// come back with it, so preprocess/postprocess stay on the invoking
    /// task while process runs off it.
    async fn process_in_background(
        &self,
        handle: &WorkerHandle,
        mut guard: OwnedMutexGuard<WorkerInstance>,
        mut ctx: WorkerContext,
    ) -> (OwnedMutexGuard<WorkerInstance>, WorkerContext) {
        let worker_id = guard.id.clone();
        let cancel = ctx.cancel.clone();
        let batch = ctx.batch;
        debug!(worker = %worker_id, "process (background context)");

        let join = tokio::spawn(async move {
            if let Err(err) = guard.worker.process(&mut ctx).await {
                ctx.report.fail(err.to_string());
            }
            if ctx.cancel.is_canceled() {
                ctx.report.cancel();
            }
            (guard, ctx)
        });

        match join.await {
            Ok(pair) => pair,
            Err(err) => {
                // The process phase panicked; the instance lock was released
                // when the background task unwound. Re-lock and synthesize a
                // failed report so postprocess still runs.
                error!(worker = %worker_id, error = %err, "process panicked on background context");
                let guard = handle.inner.clone().lock_owned().await;
                let mut report = Report::started();
                report.fail(format!("process panicked: {err}"));
                let ctx = WorkerContext {
                    report,
                    params: guard.params.clone(),
                    batch,
                    cancel,
                };
                (guard, ctx)
            }
        }
    }
}

fn aborted_report() -> Report {
    let mut report = Report::started();
    report.fail("singleton execution aborted before completing");
    report.finish();
    report
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
