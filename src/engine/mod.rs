// src/engine/mod.rs

//! Execution engine: registry lifecycle, worker cache, execute and batch.

pub mod batch;
pub mod cancel;
mod execute;
pub mod host;
mod workers;

pub use batch::{BatchOutcome, BatchPolicy, BatchReport};
pub use cancel::CancelToken;
pub use host::{HostDispatcher, HostJob, HostQueue};

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError, RwLock as StdRwLock};

use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

use crate::errors::Result;
use crate::manifest;
use crate::meta::{ParamValue, Platform, TaskId, TaskMeta};
use crate::registry::parse::{collect_code, collect_manifest};
use crate::registry::{CodeTasks, ParseOptions, ParseSummary, Registry, WorkerFactory};
use crate::report::Report;
use crate::resolver;
use crate::worker::WorkerHandle;

type Provider = Arc<dyn Fn(&mut CodeTasks) + Send + Sync>;

/// The orchestration engine.
///
/// Owns the registry snapshot (swapped atomically on parse), the worker
/// instance cache and the singleton in-flight gate. A process-wide default
/// instance may wrap this for convenience callers; the engine itself has an
/// explicit lifecycle and is passed around by reference.
pub struct Engine {
    host: Platform,
    providers: StdMutex<Vec<Provider>>,
    registry: StdRwLock<Arc<Registry>>,
    factories: StdRwLock<Arc<BTreeMap<TaskId, WorkerFactory>>>,
    /// Bumped on every parse; cached worker instances from an older
    /// generation are invalid and rebuilt on next lookup.
    generation: AtomicU64,
    overrides: StdMutex<HashMap<TaskId, BTreeMap<String, ParamValue>>>,
    pub(crate) workers: Mutex<HashMap<String, (u64, WorkerHandle)>>,
    /// Singleton in-flight gate. Std mutex so the entry can be removed from
    /// a synchronous drop guard; never held across an await.
    pub(crate) inflight: StdMutex<HashMap<TaskId, watch::Receiver<Option<Report>>>>,
}

impl Engine {
    /// Engine for the running host platform.
    pub fn new() -> Self {
        Self::with_host(Platform::current())
    }

    /// Engine with an explicit host platform. Definitions that do not match
    /// it never enter the registry snapshot.
    pub fn with_host(host: Platform) -> Self {
        Self {
            host,
            providers: StdMutex::new(Vec::new()),
            registry: StdRwLock::new(Arc::new(Registry::new(host))),
            factories: StdRwLock::new(Arc::new(BTreeMap::new())),
            generation: AtomicU64::new(0),
            overrides: StdMutex::new(HashMap::new()),
            workers: Mutex::new(HashMap::new()),
            inflight: StdMutex::new(HashMap::new()),
        }
    }

    pub fn host(&self) -> Platform {
        self.host
    }

    /// Register a code-declaration provider. Providers are re-run on every
    /// parse with `scan_code` enabled.
    pub fn add_provider(&self, provider: impl Fn(&mut CodeTasks) + Send + Sync + 'static) {
        self.providers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(provider));
    }

    /// Rebuild the registry from the two declaration sources.
    ///
    /// Fatal configuration errors (duplicate identities) leave the previous
    /// snapshot untouched. A missing or malformed manifest is recoverable:
    /// it is logged, reported through the summary, and the previous
    /// manifest-declared subset is kept.
    pub fn parse(&self, opts: &ParseOptions) -> Result<ParseSummary> {
        let prev = self.snapshot();
        let mut next = Registry::new(self.host);
        let mut summary = ParseSummary::default();
        let mut new_factories = None;

        if opts.scan_code {
            let providers = self
                .providers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            let mut tasks = CodeTasks::default();
            for provider in &providers {
                provider(&mut tasks);
            }
            let (metas, factories) = collect_code(tasks.into_decls(), self.host)?;
            summary.code_tasks = metas.len();
            next.set_code(metas);
            new_factories = Some(factories);
        } else {
            let code = prev.code_subset().clone();
            summary.code_tasks = code.len();
            next.set_code(code);
        }

        match &opts.manifest_path {
            Some(path) => match manifest::load_from_path(path) {
                Ok(raw) => {
                    let scan = manifest::scan(raw);
                    summary.skipped_entries = scan.skipped.clone();
                    let (metas, commands) = collect_manifest(scan, self.host)?;
                    summary.manifest_tasks = metas.len();
                    next.set_manifest(metas, commands);
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to load manifest; keeping previous manifest-declared tasks"
                    );
                    summary.manifest_error = Some(err.to_string());
                    let (metas, commands) = prev.manifest_subset();
                    summary.manifest_tasks = metas.len();
                    next.set_manifest(metas.clone(), commands.clone());
                }
            },
            None => {
                let (metas, commands) = prev.manifest_subset();
                summary.manifest_tasks = metas.len();
                next.set_manifest(metas.clone(), commands.clone());
            }
        }

        // Swap the snapshot atomically; readers hold Arcs to the old one.
        *self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(next);
        if let Some(factories) = new_factories {
            *self
                .factories
                .write()
                .unwrap_or_else(PoisonError::into_inner) = Arc::new(factories);
        }
        self.generation.fetch_add(1, Ordering::SeqCst);

        info!(
            code_tasks = summary.code_tasks,
            manifest_tasks = summary.manifest_tasks,
            skipped = summary.skipped_entries.len(),
            "registry parsed"
        );
        Ok(summary)
    }

    /// Current registry snapshot.
    pub fn snapshot(&self) -> Arc<Registry> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn factories(&self) -> Arc<BTreeMap<TaskId, WorkerFactory>> {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Merged, ordered enumeration of the current definitions.
    pub fn metas(&self) -> Vec<TaskMeta> {
        self.snapshot().metas().into_iter().cloned().collect()
    }

    /// Resolve a `"group/name"` identity or unique bare name.
    pub fn find(&self, query: &str) -> Result<TaskId> {
        self.snapshot().find(query)
    }

    /// Expand `target` into an ordered execution plan.
    pub fn resolve(&self, target: &TaskId) -> Result<Vec<TaskId>> {
        resolver::resolve(&self.snapshot(), target)
    }

    /// Record a user override for a declared parameter. Takes effect when a
    /// worker instance is (re)created; overrides for undeclared names are
    /// ignored with a warning at that point.
    pub fn set_param(&self, id: &TaskId, name: impl Into<String>, value: ParamValue) {
        self.overrides
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id.clone())
            .or_default()
            .insert(name.into(), value);
    }

    pub(crate) fn overrides_for(&self, id: &TaskId) -> Option<BTreeMap<String, ParamValue>> {
        self.overrides
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("host", &self.host)
            .field("generation", &self.current_generation())
            .finish_non_exhaustive()
    }
}
