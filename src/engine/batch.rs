// src/engine/batch.rs

//! Unattended execution of an ordered plan with an aggregate exit signal.

use serde::Serialize;
use tracing::{info, warn};

use crate::engine::{CancelToken, Engine};
use crate::errors::Result;
use crate::meta::TaskId;
use crate::report::{Report, TaskResult};

/// What to do with the rest of the plan after a worker fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchPolicy {
    /// Stop dispatching; workers not yet started stay unstarted.
    #[default]
    StopOnFailure,
    /// Keep executing the remaining plan.
    ContinueOnFailure,
}

/// One worker's result within a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub task: TaskId,
    pub report: Report,
}

/// Aggregate outcome of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub reports: Vec<BatchReport>,
}

impl BatchOutcome {
    /// True only if every collected report succeeded.
    pub fn success(&self) -> bool {
        self.reports
            .iter()
            .all(|r| r.report.result == TaskResult::Succeeded)
    }

    /// Process-style exit signal for scripted consumption.
    pub fn exit_code(&self) -> i32 {
        if self.success() { 0 } else { 1 }
    }
}

impl Engine {
    /// Execute `plan` in order, collecting one Report per worker.
    ///
    /// A worker that has started always finishes its postprocess (the
    /// execute path guarantees it); the policy only decides whether workers
    /// *after* a failure are dispatched at all.
    pub async fn batch(&self, plan: &[TaskId], policy: BatchPolicy) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();

        for id in plan {
            let handle = self.worker(id).await?;

            info!(task = %id, "batch: executing");
            // Batch mode is carried per execution; the cached instance is
            // left untouched for later direct executes.
            let report = self
                .execute_inner(&handle, CancelToken::new(), true)
                .await;
            let failed = report.result != TaskResult::Succeeded;
            outcome.reports.push(BatchReport {
                task: id.clone(),
                report,
            });

            if failed {
                warn!(task = %id, "batch: task did not succeed");
                if policy == BatchPolicy::StopOnFailure {
                    break;
                }
            }
        }

        Ok(outcome)
    }

    /// Resolve `target` and batch-execute the resulting plan.
    pub async fn run_task(&self, target: &TaskId, policy: BatchPolicy) -> Result<BatchOutcome> {
        let plan = self.resolve(target)?;
        info!(target = %target, steps = plan.len(), "running resolved plan");
        self.batch(&plan, policy).await
    }
}
