// src/registry/mod.rs

//! Registry of task definitions merged from two declaration sources.
//!
//! The registry keeps the code-declared and manifest-declared definitions in
//! separate sub-maps and joins them into a read-only merged view. Parsing
//! replaces the manifest sub-map wholesale and re-collects the code sub-map;
//! the engine swaps whole snapshots atomically so readers never observe a
//! partially merged state.

pub mod code;
pub mod parse;

pub use code::{CodeTaskDecl, CodeTasks, WorkerFactory};
pub use parse::{ParseOptions, ParseSummary};

use std::collections::BTreeMap;

use crate::errors::{Result, TaskdockError};
use crate::meta::{Platform, TaskId, TaskMeta};

/// One immutable registry snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    host: Platform,
    code: BTreeMap<TaskId, TaskMeta>,
    manifest: BTreeMap<TaskId, TaskMeta>,
    /// Manifest command strings keyed by identity (opaque to the engine).
    commands: BTreeMap<TaskId, String>,
}

impl Registry {
    pub fn new(host: Platform) -> Self {
        Self {
            host,
            code: BTreeMap::new(),
            manifest: BTreeMap::new(),
            commands: BTreeMap::new(),
        }
    }

    pub fn host(&self) -> Platform {
        self.host
    }

    /// Look up a definition in the merged view.
    ///
    /// A manifest identity parsed later replaces a code-declared one, so the
    /// manifest sub-map is consulted first.
    pub fn get(&self, id: &TaskId) -> Option<&TaskMeta> {
        self.manifest.get(id).or_else(|| self.code.get(id))
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.get(id).is_some()
    }

    /// Command string for a manifest-declared task, if any.
    pub fn command_for(&self, id: &TaskId) -> Option<&str> {
        self.commands.get(id).map(String::as_str)
    }

    /// Merged read-only view, ordered by group, then ascending priority,
    /// then name.
    pub fn metas(&self) -> Vec<&TaskMeta> {
        let mut all: BTreeMap<&TaskId, &TaskMeta> = self.code.iter().collect();
        for (id, meta) in self.manifest.iter() {
            all.insert(id, meta);
        }

        let mut metas: Vec<&TaskMeta> = all.into_values().collect();
        metas.sort_by(|a, b| {
            (&a.id.group, a.priority, &a.id.name).cmp(&(&b.id.group, b.priority, &b.id.name))
        });
        metas
    }

    /// Number of distinct identities in the merged view.
    pub fn len(&self) -> usize {
        self.metas().len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty() && self.manifest.is_empty()
    }

    /// Resolve a user-supplied query to an identity.
    ///
    /// Accepts either a full `"group/name"` identity or a bare name that is
    /// unique across the registry.
    pub fn find(&self, query: &str) -> Result<TaskId> {
        if query.contains('/') {
            let id: TaskId = query.parse()?;
            return if self.contains(&id) {
                Ok(id)
            } else {
                Err(TaskdockError::TaskNotFound(id))
            };
        }

        let matches: Vec<&TaskMeta> = self
            .metas()
            .into_iter()
            .filter(|m| m.id.name == query)
            .collect();

        match matches.as_slice() {
            [] => Err(TaskdockError::Config(format!("no task named '{query}'"))),
            [one] => Ok(one.id.clone()),
            many => {
                let ids: Vec<String> = many.iter().map(|m| m.id.to_string()).collect();
                Err(TaskdockError::Config(format!(
                    "task name '{query}' is ambiguous (matches {})",
                    ids.join(", ")
                )))
            }
        }
    }

    pub(crate) fn set_code(&mut self, metas: BTreeMap<TaskId, TaskMeta>) {
        self.code = metas;
    }

    pub(crate) fn set_manifest(
        &mut self,
        metas: BTreeMap<TaskId, TaskMeta>,
        commands: BTreeMap<TaskId, String>,
    ) {
        self.manifest = metas;
        self.commands = commands;
    }

    pub(crate) fn code_subset(&self) -> &BTreeMap<TaskId, TaskMeta> {
        &self.code
    }

    pub(crate) fn manifest_subset(&self) -> (&BTreeMap<TaskId, TaskMeta>, &BTreeMap<TaskId, String>) {
        (&self.manifest, &self.commands)
    }
}
