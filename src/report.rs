// src/report.rs

//! Structured execution outcome.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Final status of one execute call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskResult {
    #[default]
    Succeeded,
    Failed,
    Canceled,
}

/// Outcome of one `Engine::execute` call.
///
/// Owned by the caller once execution completes; `Clone` so that a second
/// caller joining an in-flight singleton execution receives the same Report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub result: TaskResult,

    /// Failure cause; empty unless `result` is `Failed`.
    #[serde(default)]
    pub error: String,

    /// Free-form extras recorded by worker phases, for callers that want
    /// more than the result (artifact paths, exit codes, counters).
    #[serde(default)]
    pub extras: BTreeMap<String, String>,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Report {
    /// Fresh report with the start timestamp taken now.
    pub fn started() -> Self {
        Self {
            result: TaskResult::Succeeded,
            error: String::new(),
            extras: BTreeMap::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Mark the report failed with the given cause.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.result = TaskResult::Failed;
        self.error = error.into();
    }

    /// Mark the report canceled unless a failure was already recorded.
    pub fn cancel(&mut self) {
        if self.result == TaskResult::Succeeded {
            self.result = TaskResult::Canceled;
        }
    }

    /// Take the end timestamp.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn succeeded(&self) -> bool {
        self.result == TaskResult::Succeeded
    }

    /// Elapsed wall time; uses "now" while the report is still open.
    pub fn elapsed(&self) -> TimeDelta {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::started()
    }
}
