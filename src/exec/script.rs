// src/exec/script.rs

//! Worker backing manifest-declared tasks.
//!
//! Runs the declared script through the platform shell, streams its output
//! into the log at debug, and records the exit code as a report extra.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::interval;
use tracing::{debug, info};

use crate::worker::{ProcessFuture, TaskWorker, WorkerContext};

/// How often a running script checks for cancellation.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct ScriptWorker {
    command: Option<String>,
}

impl ScriptWorker {
    pub fn new(command: Option<String>) -> Self {
        Self { command }
    }
}

impl TaskWorker for ScriptWorker {
    fn preprocess(&mut self, _ctx: &mut WorkerContext) -> anyhow::Result<()> {
        if self.command.is_none() {
            bail!("manifest entry declares metadata but no command");
        }
        Ok(())
    }

    fn process<'a>(&'a mut self, ctx: &'a mut WorkerContext) -> ProcessFuture<'a> {
        Box::pin(async move {
            let Some(script) = self.command.clone() else {
                bail!("manifest entry declares metadata but no command");
            };

            info!(cmd = %script, "starting script process");

            // Build a shell command appropriate for the platform.
            let mut cmd = if cfg!(windows) {
                let mut c = Command::new("cmd");
                c.arg("/C").arg(&script);
                c
            } else {
                let mut c = Command::new("sh");
                c.arg("-c").arg(&script);
                c
            };

            cmd.stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            let mut child = cmd.spawn().context("spawning script process")?;

            // Consume both pipes so OS buffers don't fill; log lines at debug.
            if let Some(stdout) = child.stdout.take() {
                tokio::spawn(async move {
                    let mut lines = BufReader::new(stdout).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        debug!("stdout: {}", line);
                    }
                });
            }
            if let Some(stderr) = child.stderr.take() {
                tokio::spawn(async move {
                    let mut lines = BufReader::new(stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        debug!("stderr: {}", line);
                    }
                });
            }

            // Poll cancellation while the child runs; on cancel, kill the
            // child and let the engine record the canceled result.
            let mut poll = interval(CANCEL_POLL_INTERVAL);
            let status = loop {
                tokio::select! {
                    status = child.wait() => {
                        break status.context("waiting for script process")?;
                    }
                    _ = poll.tick() => {
                        if ctx.cancel.is_canceled() {
                            debug!("cancel requested; killing script process");
                            child.kill().await.context("killing script process")?;
                            break child
                                .wait()
                                .await
                                .context("waiting for killed script process")?;
                        }
                    }
                }
            };

            let code = status.code().unwrap_or(-1);
            ctx.set_extra("exit_code", code.to_string());
            info!(exit_code = code, success = status.success(), "script process exited");

            if ctx.cancel.is_canceled() {
                return Ok(());
            }
            if !status.success() {
                bail!("script exited with status {code}");
            }
            Ok(())
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::engine::CancelToken;
    use crate::report::Report;

    fn test_ctx() -> WorkerContext {
        WorkerContext {
            report: Report::started(),
            params: BTreeMap::new(),
            batch: false,
            cancel: CancelToken::new(),
        }
    }

    #[tokio::test]
    async fn zero_exit_succeeds_and_records_exit_code() {
        let mut worker = ScriptWorker::new(Some("true".into()));
        let mut ctx = test_ctx();
        worker.process(&mut ctx).await.unwrap();
        assert_eq!(
            ctx.report.extras.get("exit_code").map(String::as_str),
            Some("0")
        );
    }

    #[tokio::test]
    async fn nonzero_exit_is_an_error() {
        let mut worker = ScriptWorker::new(Some("exit 3".into()));
        let mut ctx = test_ctx();
        let err = worker.process(&mut ctx).await.unwrap_err();
        assert!(err.to_string().contains('3'), "unexpected error: {err}");
        assert_eq!(
            ctx.report.extras.get("exit_code").map(String::as_str),
            Some("3")
        );
    }

    #[tokio::test]
    async fn missing_command_is_rejected_in_preprocess() {
        let mut worker = ScriptWorker::new(None);
        let mut ctx = test_ctx();
        assert!(worker.preprocess(&mut ctx).is_err());
    }

    #[tokio::test]
    async fn cancel_kills_a_running_script() {
        let mut worker = ScriptWorker::new(Some("sleep 30".into()));
        let mut ctx = test_ctx();
        let cancel = ctx.cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        });
        tokio::time::timeout(Duration::from_secs(5), worker.process(&mut ctx))
            .await
            .expect("script was not killed on cancel")
            .unwrap();
    }
}
