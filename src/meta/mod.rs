// src/meta/mod.rs

//! Task declarations: identity, flags, parameters and dependency references.

pub mod param;
pub mod platform;

pub use param::{ParamDef, ParamValue};
pub use platform::Platform;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::TaskdockError;

/// Task identity: a unique `(group, name)` pair, written `"group/name"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TaskId {
    pub group: String,
    pub name: String,
}

impl TaskId {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.name)
    }
}

impl FromStr for TaskId {
    type Err = TaskdockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((group, name)) if !group.is_empty() && !name.is_empty() => {
                Ok(TaskId::new(group, name))
            }
            _ => Err(TaskdockError::Config(format!(
                "task identity must be written 'group/name' (got '{s}')"
            ))),
        }
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for TaskId {
    type Error = TaskdockError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Which declaration source produced a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Code,
    Manifest,
}

impl Provenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Provenance::Code => "code",
            Provenance::Manifest => "manifest",
        }
    }
}

/// A task's immutable declaration ("Meta").
///
/// `priority` is ascending: lower values list earlier when tasks are grouped
/// for enumeration. `pre` and `post` reference other task identities and are
/// kept in declared order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMeta {
    pub id: TaskId,

    #[serde(default)]
    pub tooltip: String,

    #[serde(default)]
    pub priority: i32,

    #[serde(default)]
    pub singleton: bool,

    #[serde(default)]
    pub run_async: bool,

    #[serde(default)]
    pub platform: Platform,

    #[serde(default)]
    pub params: Vec<ParamDef>,

    #[serde(default)]
    pub pre: Vec<TaskId>,

    #[serde(default)]
    pub post: Vec<TaskId>,

    pub provenance: Provenance,
}

impl TaskMeta {
    /// Minimal declaration; fill the rest through the public fields or the
    /// `with_*` helpers.
    pub fn new(id: TaskId, provenance: Provenance) -> Self {
        Self {
            id,
            tooltip: String::new(),
            priority: 0,
            singleton: false,
            run_async: false,
            platform: Platform::Any,
            params: Vec::new(),
            pre: Vec::new(),
            post: Vec::new(),
            provenance,
        }
    }

    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn singleton(mut self) -> Self {
        self.singleton = true;
        self
    }

    pub fn run_async(mut self) -> Self {
        self.run_async = true;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_param(mut self, param: ParamDef) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_pre(mut self, id: TaskId) -> Self {
        self.pre.push(id);
        self
    }

    pub fn with_post(mut self, id: TaskId) -> Self {
        self.post.push(id);
        self
    }

    /// Apply the platform filter for `host`.
    ///
    /// Returns `None` if the task itself is invisible on `host`; otherwise a
    /// copy with non-matching parameter definitions stripped.
    pub fn filtered_for(&self, host: Platform) -> Option<TaskMeta> {
        if !self.platform.matches(host) {
            return None;
        }
        let mut meta = self.clone();
        meta.params.retain(|p| p.platform.matches(host));
        Some(meta)
    }

    /// Default parameter values keyed by name, in declared order.
    pub fn default_params(&self) -> BTreeMap<String, ParamValue> {
        self.params
            .iter()
            .map(|p| (p.name.clone(), p.default.clone()))
            .collect()
    }
}
