// src/manifest/loader.rs

use std::fs;
use std::path::Path;

use tracing::warn;

use crate::errors::Result;
use crate::manifest::model::{RawManifest, RawScriptMeta};
use crate::meta::TaskMeta;

/// One manifest entry ready for registry merge.
#[derive(Debug, Clone)]
pub struct ManifestEntry {
    /// Manifest key the entry was declared under.
    pub key: String,
    /// Command string from `[scripts]`, if the key has one. Opaque to the
    /// engine; the script worker hands it to the shell.
    pub command: Option<String>,
    pub meta: TaskMeta,
}

/// Result of scanning one manifest.
#[derive(Debug, Clone, Default)]
pub struct ManifestScan {
    pub entries: Vec<ManifestEntry>,
    /// Keys whose metadata failed to deserialize, with the error text.
    /// These are skipped with a warning; the rest of the manifest is kept.
    pub skipped: Vec<(String, String)>,
}

/// Read and deserialize the manifest file.
///
/// This only performs TOML deserialization of the outer shape; per-entry
/// metadata is deserialized later by [`scan`] so a single malformed entry
/// does not discard the whole manifest.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawManifest> {
    let contents = fs::read_to_string(path.as_ref())?;
    let raw: RawManifest = toml::from_str(&contents)?;
    Ok(raw)
}

/// Turn a raw manifest into entries, resolving metadata defaults.
///
/// The union of `[scripts]` and `[scripts_meta]` keys is considered: a key
/// with only a command gets default metadata, a key with only metadata gets
/// no command.
pub fn scan(raw: RawManifest) -> ManifestScan {
    let mut out = ManifestScan::default();

    let mut keys: Vec<&String> = raw.scripts.keys().collect();
    for key in raw.scripts_meta.keys() {
        if !raw.scripts.contains_key(key) {
            keys.push(key);
        }
    }

    for key in keys {
        let meta = match raw.scripts_meta.get(key) {
            Some(value) => match value.clone().try_into::<RawScriptMeta>() {
                Ok(m) => m.into_meta(key),
                Err(err) => {
                    warn!(key = %key, error = %err, "skipping malformed scripts_meta entry");
                    out.skipped.push((key.clone(), err.to_string()));
                    continue;
                }
            },
            None => RawScriptMeta::default().into_meta(key),
        };

        out.entries.push(ManifestEntry {
            key: key.clone(),
            command: raw.scripts.get(key).cloned(),
            meta,
        });
    }

    out
}

/// Convenience wrapper: read, deserialize and scan in one call.
pub fn load_and_scan(path: impl AsRef<Path>) -> Result<ManifestScan> {
    let raw = load_from_path(path)?;
    Ok(scan(raw))
}
