// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `taskdock`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskdock",
    version,
    about = "Run declared tasks with dependency resolution.",
    long_about = None
)]
pub struct CliArgs {
    /// Tasks to run, as `group/name` or a unique bare name.
    ///
    /// With no tasks given, behaves like `--list`.
    #[arg(value_name = "TASK")]
    pub tasks: Vec<String>,

    /// Path to the task manifest (TOML).
    ///
    /// Default: `Taskdock.toml` in the current working directory. A missing
    /// manifest is not an error; only code-declared tasks are available.
    #[arg(long, value_name = "PATH", default_value = "Taskdock.toml")]
    pub manifest: String,

    /// Skip the code-declaration providers; manifest tasks only.
    #[arg(long)]
    pub no_code_scan: bool,

    /// List the visible tasks and exit.
    #[arg(long)]
    pub list: bool,

    /// Print the resolved execution plan without executing anything.
    #[arg(long)]
    pub plan: bool,

    /// Keep executing the remaining plan after a task fails.
    #[arg(long)]
    pub continue_on_error: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKDOCK_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
