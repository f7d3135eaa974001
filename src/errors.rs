// src/errors.rs

//! Crate-wide error type and Result alias.

use thiserror::Error;

use crate::meta::TaskId;

#[derive(Error, Debug)]
pub enum TaskdockError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("duplicate task identity '{id}' among {provenance}-declared tasks")]
    DuplicateTask { id: TaskId, provenance: &'static str },

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("unknown dependency '{dependency}' referenced by '{referenced_by}'")]
    UnknownDependency {
        dependency: TaskId,
        referenced_by: TaskId,
    },

    #[error("Cycle detected in task graph: {0}")]
    DependencyCycle(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TaskdockError>;
