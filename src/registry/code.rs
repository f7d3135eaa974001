// src/registry/code.rs

//! Code-declared task registration.
//!
//! Instead of runtime type scanning, code-declared tasks register themselves
//! through provider functions: the host calls `Engine::add_provider` with a
//! module-level registration function, and every parse re-runs the providers
//! against a fresh [`CodeTasks`] collector. This keeps re-parsing idempotent
//! and makes the set of code-declared tasks explicit.

use std::sync::Arc;

use crate::meta::TaskMeta;
use crate::worker::TaskWorker;

/// Factory producing a fresh worker for a code-declared task.
pub type WorkerFactory = Arc<dyn Fn() -> Box<dyn TaskWorker> + Send + Sync>;

/// One code-declared task: its meta plus the factory that builds its worker.
#[derive(Clone)]
pub struct CodeTaskDecl {
    pub meta: TaskMeta,
    pub factory: WorkerFactory,
}

impl std::fmt::Debug for CodeTaskDecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeTaskDecl")
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

/// Collector handed to registration provider functions.
#[derive(Debug, Default)]
pub struct CodeTasks {
    decls: Vec<CodeTaskDecl>,
}

impl CodeTasks {
    /// Declare one task with the closure that builds its worker.
    pub fn declare<F, W>(&mut self, meta: TaskMeta, factory: F)
    where
        F: Fn() -> W + Send + Sync + 'static,
        W: TaskWorker + 'static,
    {
        self.decls.push(CodeTaskDecl {
            meta,
            factory: Arc::new(move || Box::new(factory())),
        });
    }

    pub(crate) fn into_decls(self) -> Vec<CodeTaskDecl> {
        self.decls
    }
}
