// src/manifest/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::meta::{ParamDef, Platform, Provenance, TaskId, TaskMeta};

/// Top-level manifest shape as read from a TOML file.
///
/// ```toml
/// [scripts]
/// test = "cargo test"
/// build = "cargo build --release"
///
/// [scripts_meta.test]
/// group = "ci"
/// tooltip = "Run the test suite"
/// priority = 10
/// singleton = true
///
/// [[scripts_meta.test.params]]
/// name = "filter"
/// default = ""
/// persist = true
/// ```
///
/// The command strings under `[scripts]` are opaque to the engine. Keys that
/// appear in only one of the two tables are tolerated; metadata defaults
/// fill the gaps.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawManifest {
    /// `[scripts]`: key → command string.
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,

    /// `[scripts_meta.<key>]`: per-key task metadata, kept as raw TOML
    /// values so one malformed entry does not discard the whole manifest.
    #[serde(default)]
    pub scripts_meta: BTreeMap<String, toml::Value>,
}

/// One `[scripts_meta.<key>]` entry once individually deserialized.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawScriptMeta {
    /// Task name; defaults to the manifest key.
    #[serde(default)]
    pub name: Option<String>,

    /// Task group; defaults to `"scripts"`.
    #[serde(default)]
    pub group: Option<String>,

    #[serde(default)]
    pub tooltip: String,

    #[serde(default)]
    pub priority: i32,

    #[serde(default)]
    pub singleton: bool,

    #[serde(default, rename = "runasync")]
    pub run_async: bool,

    #[serde(default)]
    pub platform: Platform,

    #[serde(default)]
    pub params: Vec<ParamDef>,

    /// Identities of tasks to run immediately before this one.
    #[serde(default)]
    pub pre: Vec<TaskId>,

    /// Identities of tasks to run immediately after this one.
    #[serde(default)]
    pub post: Vec<TaskId>,
}

impl RawScriptMeta {
    /// Resolve defaults against the manifest key and produce the registry
    /// declaration.
    pub fn into_meta(self, key: &str) -> TaskMeta {
        let group = self.group.unwrap_or_else(|| "scripts".to_string());
        let name = self.name.unwrap_or_else(|| key.to_string());

        TaskMeta {
            id: TaskId::new(group, name),
            tooltip: self.tooltip,
            priority: self.priority,
            singleton: self.singleton,
            run_async: self.run_async,
            platform: self.platform,
            params: self.params,
            pre: self.pre,
            post: self.post,
            provenance: Provenance::Manifest,
        }
    }
}
