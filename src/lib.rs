// src/lib.rs

pub mod cli;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod manifest;
pub mod meta;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod worker;

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::engine::{BatchPolicy, Engine};
use crate::meta::TaskId;
use crate::registry::ParseOptions;

/// High-level entry point used by `main.rs`.
///
/// Wires together the engine, the built-in provider, the manifest parse and
/// the requested CLI mode, and returns the process exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    let engine = Engine::new();
    engine.add_provider(exec::builtin::register);

    let manifest_path = PathBuf::from(&args.manifest);
    let mut opts = ParseOptions::new().scan_code(!args.no_code_scan);
    if manifest_path.is_file() {
        opts = opts.with_manifest(&manifest_path);
    } else {
        debug!(
            path = %manifest_path.display(),
            "no manifest file; code-declared tasks only"
        );
    }
    let summary = engine.parse(&opts)?;
    debug!(
        code_tasks = summary.code_tasks,
        manifest_tasks = summary.manifest_tasks,
        "parse complete"
    );

    if args.list || args.tasks.is_empty() {
        print_task_list(&engine);
        return Ok(0);
    }

    let mut targets = Vec::new();
    for query in &args.tasks {
        targets.push(engine.find(query)?);
    }

    // One merged plan across all targets; first occurrence wins.
    let mut plan: Vec<TaskId> = Vec::new();
    for target in &targets {
        for id in engine.resolve(target)? {
            if !plan.contains(&id) {
                plan.push(id);
            }
        }
    }

    if args.plan {
        for id in &plan {
            println!("{id}");
        }
        return Ok(0);
    }

    let policy = if args.continue_on_error {
        BatchPolicy::ContinueOnFailure
    } else {
        BatchPolicy::StopOnFailure
    };

    let outcome = engine.batch(&plan, policy).await?;
    for entry in &outcome.reports {
        info!(task = %entry.task, result = ?entry.report.result, "task finished");
    }
    Ok(outcome.exit_code())
}

/// Enumerate the merged registry on stdout.
fn print_task_list(engine: &Engine) {
    let metas = engine.metas();
    println!("tasks ({}):", metas.len());
    for meta in metas {
        let mut flags = Vec::new();
        if meta.singleton {
            flags.push("singleton");
        }
        if meta.run_async {
            flags.push("run-async");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };
        if meta.tooltip.is_empty() {
            println!("  - {}{flags}", meta.id);
        } else {
            println!("  - {}{flags}  {}", meta.id, meta.tooltip);
        }
    }
}
