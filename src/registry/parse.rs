// src/registry/parse.rs

//! Parse-time collection of the two declaration sources.
//!
//! Fatal configuration errors (duplicate identity within one provenance)
//! abort the whole parse before any snapshot swap; recoverable manifest
//! problems are reported through [`ParseSummary`] instead.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::errors::{Result, TaskdockError};
use crate::manifest::ManifestScan;
use crate::meta::{Platform, TaskId, TaskMeta};
use crate::registry::code::{CodeTaskDecl, WorkerFactory};

/// Inputs for one `Engine::parse` call.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Manifest file to merge; `None` leaves the previous manifest-declared
    /// subset in place.
    pub manifest_path: Option<PathBuf>,

    /// Whether to re-run the code-declaration providers. When disabled the
    /// previous code-declared subset is kept as-is.
    pub scan_code: bool,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self {
            manifest_path: None,
            scan_code: true,
        }
    }

    pub fn with_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }

    pub fn scan_code(mut self, scan: bool) -> Self {
        self.scan_code = scan;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// What one parse call did, including recoverable manifest problems.
#[derive(Debug, Clone, Default)]
pub struct ParseSummary {
    /// Code-declared tasks visible on this host after the parse.
    pub code_tasks: usize,
    /// Manifest-declared tasks visible on this host after the parse.
    pub manifest_tasks: usize,
    /// Set when the manifest file could not be read or deserialized; the
    /// previous manifest-declared subset was kept.
    pub manifest_error: Option<String>,
    /// Manifest keys skipped because their metadata was malformed.
    pub skipped_entries: Vec<(String, String)>,
}

/// Platform-filter and key the code declarations, rejecting duplicate
/// identities within the code provenance.
pub(crate) fn collect_code(
    decls: Vec<CodeTaskDecl>,
    host: Platform,
) -> Result<(
    BTreeMap<TaskId, TaskMeta>,
    BTreeMap<TaskId, WorkerFactory>,
)> {
    let mut metas = BTreeMap::new();
    let mut factories = BTreeMap::new();

    for decl in decls {
        let Some(meta) = decl.meta.filtered_for(host) else {
            continue;
        };
        let id = meta.id.clone();
        if metas.insert(id.clone(), meta).is_some() {
            return Err(TaskdockError::DuplicateTask {
                id,
                provenance: "code",
            });
        }
        factories.insert(id, decl.factory);
    }

    Ok((metas, factories))
}

/// Platform-filter and key the scanned manifest entries, rejecting duplicate
/// identities within the manifest provenance.
pub(crate) fn collect_manifest(
    scan: ManifestScan,
    host: Platform,
) -> Result<(BTreeMap<TaskId, TaskMeta>, BTreeMap<TaskId, String>)> {
    let mut metas = BTreeMap::new();
    let mut commands = BTreeMap::new();

    for entry in scan.entries {
        let Some(meta) = entry.meta.filtered_for(host) else {
            continue;
        };
        let id = meta.id.clone();
        if metas.insert(id.clone(), meta).is_some() {
            return Err(TaskdockError::DuplicateTask {
                id,
                provenance: "manifest",
            });
        }
        if let Some(cmd) = entry.command {
            commands.insert(id, cmd);
        }
    }

    Ok((metas, commands))
}
