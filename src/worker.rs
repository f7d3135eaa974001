// src/worker.rs

//! Worker lifecycle trait and runtime instances.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::engine::CancelToken;
use crate::meta::{ParamValue, TaskMeta};
use crate::report::Report;

/// Boxed future returned by [`TaskWorker::process`].
pub type ProcessFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// State shared with a worker across its three phases.
pub struct WorkerContext {
    /// Report under construction; phases may record extras. Errors are
    /// captured by the engine from the phase return values.
    pub report: Report,

    /// Bound parameter values: declared defaults overridden by user values.
    pub params: BTreeMap<String, ParamValue>,

    /// Set when the worker runs as part of an unattended batch.
    pub batch: bool,

    /// Cooperative cancellation token; poll between sub-steps.
    pub cancel: CancelToken,
}

impl WorkerContext {
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    pub fn set_extra(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.report.extras.insert(key.into(), value.into());
    }
}

/// Three-phase task lifecycle.
///
/// The engine guarantees the call order and that `postprocess` runs once
/// `preprocess` has run, regardless of earlier failures or cancellation.
pub trait TaskWorker: Send {
    /// Validate inputs and prepare resources. An `Err` marks the report
    /// failed and skips `process`.
    fn preprocess(&mut self, _ctx: &mut WorkerContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// The task's main effect. Runs inline on the invoking task, or on the
    /// background execution context when the task is declared run-async.
    /// Interaction with host-exclusive state from there must go through the
    /// explicit host dispatch queue.
    fn process<'a>(&'a mut self, ctx: &'a mut WorkerContext) -> ProcessFuture<'a>;

    /// Release resources. Best effort: errors are logged, never raised, and
    /// never replace an already-recorded failure cause.
    fn postprocess(&mut self, _ctx: &mut WorkerContext) -> anyhow::Result<()> {
        Ok(())
    }
}

/// A runtime instance bound to one task definition.
pub struct WorkerInstance {
    /// Instance identifier: the task identity, optionally namespaced as
    /// `"group/name/instance"` for concurrent non-singleton runs.
    pub id: String,

    pub meta: TaskMeta,

    /// Instance-level batch-mode default. Batch runs mark the execution
    /// context per run instead of touching this.
    pub batch: bool,

    /// Current parameter values (defaults overridden by user values).
    pub params: BTreeMap<String, ParamValue>,

    pub(crate) worker: Box<dyn TaskWorker>,
}

impl fmt::Debug for WorkerInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerInstance")
            .field("id", &self.id)
            .field("meta", &self.meta.id)
            .field("batch", &self.batch)
            .finish_non_exhaustive()
    }
}

/// Shared handle to a worker instance.
///
/// The meta copy is readable without taking the instance lock, which the
/// singleton gate relies on while an execution is in flight.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    pub(crate) meta: TaskMeta,
    pub(crate) inner: Arc<tokio::sync::Mutex<WorkerInstance>>,
}

impl WorkerHandle {
    pub(crate) fn new(instance: WorkerInstance) -> Self {
        Self {
            meta: instance.meta.clone(),
            inner: Arc::new(tokio::sync::Mutex::new(instance)),
        }
    }

    pub fn meta(&self) -> &TaskMeta {
        &self.meta
    }

    /// Instance identifier (may be namespaced).
    pub async fn id(&self) -> String {
        self.inner.lock().await.id.clone()
    }

    /// Whether this handle points at the same instance as `other`.
    pub fn same_instance(&self, other: &WorkerHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
