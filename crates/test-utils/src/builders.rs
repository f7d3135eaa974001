#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use taskdock::meta::{ParamDef, ParamValue, Platform, Provenance, TaskId, TaskMeta};

/// Parse a `"group/name"` identity, panicking on malformed input.
pub fn id(s: &str) -> TaskId {
    s.parse().expect("test task id must be 'group/name'")
}

/// Minimal code-declared meta for `group/name`.
pub fn code_meta(s: &str) -> TaskMeta {
    TaskMeta::new(id(s), Provenance::Code)
}

/// Minimal manifest-declared meta for `group/name`.
pub fn manifest_meta(s: &str) -> TaskMeta {
    TaskMeta::new(id(s), Provenance::Manifest)
}

/// A simple string-valued parameter definition.
pub fn str_param(name: &str, default: &str) -> ParamDef {
    ParamDef {
        name: name.to_string(),
        tooltip: String::new(),
        default: ParamValue::Str(default.to_string()),
        persist: false,
        platform: Platform::Any,
    }
}

/// Write manifest `contents` as `Taskdock.toml` under `dir` and return the
/// path.
pub fn write_manifest(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("Taskdock.toml");
    fs::write(&path, contents).expect("failed to write test manifest");
    path
}
