// src/engine/workers.rs

//! Worker instance cache.
//!
//! Instances are created on demand, cached by identifier for reuse, and
//! rebuilt when the registry generation they were created against is stale.

use tracing::{debug, warn};

use crate::engine::Engine;
use crate::errors::{Result, TaskdockError};
use crate::exec::ScriptWorker;
use crate::meta::{Provenance, TaskId};
use crate::worker::{TaskWorker, WorkerHandle, WorkerInstance};

impl Engine {
    /// Cached worker for `id`, keyed by the plain `"group/name"` identity.
    pub async fn worker(&self, id: &TaskId) -> Result<WorkerHandle> {
        self.worker_cached(id, None).await
    }

    /// Cached worker under a namespaced `"group/name/instance"` identifier.
    /// Distinct instances of a non-singleton task may execute concurrently.
    pub async fn worker_named(&self, id: &TaskId, instance: &str) -> Result<WorkerHandle> {
        self.worker_cached(id, Some(instance)).await
    }

    /// Identifiers currently held in the Workers cache, sorted.
    pub async fn worker_ids(&self) -> Vec<String> {
        let workers = self.workers.lock().await;
        let mut ids: Vec<String> = workers.keys().cloned().collect();
        ids.sort();
        ids
    }

    async fn worker_cached(&self, id: &TaskId, instance: Option<&str>) -> Result<WorkerHandle> {
        let key = match instance {
            Some(name) => format!("{id}/{name}"),
            None => id.to_string(),
        };
        let generation = self.current_generation();

        let mut workers = self.workers.lock().await;
        if let Some((created_at, handle)) = workers.get(&key) {
            if *created_at == generation {
                return Ok(handle.clone());
            }
            debug!(worker = %key, "cached worker is stale; recreating");
        }

        let handle = WorkerHandle::new(self.build_instance(id, key.clone())?);
        workers.insert(key, (generation, handle.clone()));
        Ok(handle)
    }

    fn build_instance(&self, id: &TaskId, key: String) -> Result<WorkerInstance> {
        let registry = self.snapshot();
        let meta = registry
            .get(id)
            .cloned()
            .ok_or_else(|| TaskdockError::TaskNotFound(id.clone()))?;

        let worker: Box<dyn TaskWorker> = match meta.provenance {
            Provenance::Code => {
                let factories = self.factories();
                let factory = factories.get(id).ok_or_else(|| {
                    TaskdockError::Config(format!("no worker factory registered for '{id}'"))
                })?;
                factory()
            }
            Provenance::Manifest => Box::new(ScriptWorker::new(
                registry.command_for(id).map(str::to_string),
            )),
        };

        let mut params = meta.default_params();
        if let Some(user) = self.overrides_for(id) {
            for (name, value) in user {
                if params.contains_key(&name) {
                    params.insert(name, value);
                } else {
                    warn!(task = %id, param = %name, "ignoring override for undeclared parameter");
                }
            }
        }

        debug!(worker = %key, provenance = meta.provenance.as_str(), "created worker instance");
        Ok(WorkerInstance {
            id: key,
            meta,
            batch: false,
            params,
            worker,
        })
    }
}
