// src/manifest/mod.rs

//! Manifest-declared task definitions.
//!
//! The manifest is a TOML file with a `[scripts]` table (key → command
//! string) and a parallel `[scripts_meta.<key>]` table carrying the task
//! declaration fields. See [`model::RawManifest`] for the shape.

pub mod loader;
pub mod model;

pub use loader::{ManifestEntry, ManifestScan, load_and_scan, load_from_path, scan};
pub use model::{RawManifest, RawScriptMeta};
