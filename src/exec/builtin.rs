// src/exec/builtin.rs

//! Built-in code-declared tasks under the `dock` group.
//!
//! These double as the reference implementation of the provider pattern:
//! hosts register their own task modules the same way.

use tracing::info;

use crate::meta::{ParamDef, ParamValue, Platform, Provenance, TaskId, TaskMeta};
use crate::registry::CodeTasks;
use crate::worker::{ProcessFuture, TaskWorker, WorkerContext};

/// Register the built-in tasks. Pass to `Engine::add_provider`.
pub fn register(tasks: &mut CodeTasks) {
    tasks.declare(
        TaskMeta::new(TaskId::new("dock", "doctor"), Provenance::Code)
            .with_tooltip("Report host environment diagnostics")
            .singleton(),
        || DoctorWorker,
    );

    tasks.declare(
        TaskMeta::new(TaskId::new("dock", "echo"), Provenance::Code)
            .with_tooltip("Log a configurable message")
            .with_param(ParamDef {
                name: "message".into(),
                tooltip: "Text to log".into(),
                default: ParamValue::Str("hello from taskdock".into()),
                persist: true,
                platform: Platform::Any,
            }),
        || EchoWorker,
    );
}

struct DoctorWorker;

impl TaskWorker for DoctorWorker {
    fn process<'a>(&'a mut self, ctx: &'a mut WorkerContext) -> ProcessFuture<'a> {
        Box::pin(async move {
            let platform = Platform::current();
            let cwd = std::env::current_dir()?;
            info!(platform = %platform, cwd = %cwd.display(), "host diagnostics");
            ctx.set_extra("platform", platform.to_string());
            ctx.set_extra("cwd", cwd.display().to_string());
            Ok(())
        })
    }
}

struct EchoWorker;

impl TaskWorker for EchoWorker {
    fn process<'a>(&'a mut self, ctx: &'a mut WorkerContext) -> ProcessFuture<'a> {
        Box::pin(async move {
            let message = ctx
                .param("message")
                .and_then(ParamValue::as_str)
                .unwrap_or_default()
                .to_string();
            info!(message = %message, "echo");
            ctx.set_extra("message", message);
            Ok(())
        })
    }
}
