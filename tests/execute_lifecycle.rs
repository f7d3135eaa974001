//! Three-phase lifecycle guarantees of `Engine::execute`.

use std::time::Duration;

use taskdock::engine::{CancelToken, Engine};
use taskdock::meta::{ParamValue, TaskMeta};
use taskdock::registry::{CodeTasks, ParseOptions};
use taskdock::report::TaskResult;
use taskdock::worker::TaskWorker;

use taskdock_test_utils::builders::{code_meta, id};
use taskdock_test_utils::workers::{phase_log, ProbeWorker};
use taskdock_test_utils::{init_tracing, with_timeout};

fn engine_with_worker<F, W>(meta: TaskMeta, factory: F) -> Engine
where
    F: Fn() -> W + Clone + Send + Sync + 'static,
    W: TaskWorker + 'static,
{
    let engine = Engine::new();
    engine.add_provider(move |tasks: &mut CodeTasks| {
        tasks.declare(meta.clone(), factory.clone());
    });
    engine.parse(&ParseOptions::new()).unwrap();
    engine
}

#[tokio::test]
async fn phases_run_in_order_and_succeed() {
    init_tracing();
    let log = phase_log();
    let factory_log = log.clone();
    let engine = engine_with_worker(code_meta("t/a"), move || {
        ProbeWorker::new("a", factory_log.clone())
    });

    let handle = engine.worker(&id("t/a")).await.unwrap();
    let report = with_timeout(engine.execute(&handle)).await;

    assert_eq!(report.result, TaskResult::Succeeded);
    assert!(report.finished_at.is_some());
    assert_eq!(
        *log.lock().unwrap(),
        ["a:preprocess", "a:process", "a:postprocess"]
    );
}

#[tokio::test]
async fn preprocess_failure_skips_process_but_not_postprocess() {
    init_tracing();
    let log = phase_log();
    let factory_log = log.clone();
    let engine = engine_with_worker(code_meta("t/a"), move || {
        ProbeWorker::new("a", factory_log.clone()).fail_preprocess()
    });

    let handle = engine.worker(&id("t/a")).await.unwrap();
    let report = with_timeout(engine.execute(&handle)).await;

    assert_eq!(report.result, TaskResult::Failed);
    assert!(report.error.contains("preprocess"), "error: {}", report.error);
    assert_eq!(*log.lock().unwrap(), ["a:preprocess", "a:postprocess"]);
}

#[tokio::test]
async fn process_failure_is_captured_and_postprocess_still_runs() {
    init_tracing();
    let log = phase_log();
    let factory_log = log.clone();
    let engine = engine_with_worker(code_meta("t/a"), move || {
        ProbeWorker::new("a", factory_log.clone()).fail_process()
    });

    let handle = engine.worker(&id("t/a")).await.unwrap();
    let report = with_timeout(engine.execute(&handle)).await;

    assert_eq!(report.result, TaskResult::Failed);
    assert_eq!(
        *log.lock().unwrap(),
        ["a:preprocess", "a:process", "a:postprocess"]
    );
}

#[tokio::test]
async fn postprocess_failure_fails_an_otherwise_successful_run() {
    init_tracing();
    let log = phase_log();
    let factory_log = log.clone();
    let engine = engine_with_worker(code_meta("t/a"), move || {
        ProbeWorker::new("a", factory_log.clone()).fail_postprocess()
    });

    let handle = engine.worker(&id("t/a")).await.unwrap();
    let report = with_timeout(engine.execute(&handle)).await;

    assert_eq!(report.result, TaskResult::Failed);
    assert!(report.error.contains("postprocess"), "error: {}", report.error);
}

#[tokio::test]
async fn postprocess_failure_never_masks_the_process_cause() {
    init_tracing();
    let log = phase_log();
    let factory_log = log.clone();
    let engine = engine_with_worker(code_meta("t/a"), move || {
        ProbeWorker::new("a", factory_log.clone())
            .fail_process()
            .fail_postprocess()
    });

    let handle = engine.worker(&id("t/a")).await.unwrap();
    let report = with_timeout(engine.execute(&handle)).await;

    assert_eq!(report.result, TaskResult::Failed);
    assert!(report.error.contains("process failure"), "error: {}", report.error);
    assert!(!report.error.contains("postprocess"), "error: {}", report.error);
}

#[tokio::test]
async fn cancellation_before_process_skips_it_and_reports_canceled() {
    init_tracing();
    let log = phase_log();
    let factory_log = log.clone();
    let engine = engine_with_worker(code_meta("t/a"), move || {
        ProbeWorker::new("a", factory_log.clone())
    });

    let cancel = CancelToken::new();
    cancel.cancel();

    let handle = engine.worker(&id("t/a")).await.unwrap();
    let report = with_timeout(engine.execute_with(&handle, cancel)).await;

    assert_eq!(report.result, TaskResult::Canceled);
    assert_eq!(*log.lock().unwrap(), ["a:preprocess", "a:postprocess"]);
}

#[tokio::test]
async fn run_async_tasks_keep_the_same_lifecycle_guarantees() {
    init_tracing();
    let log = phase_log();
    let factory_log = log.clone();
    let engine = engine_with_worker(code_meta("t/a").run_async(), move || {
        ProbeWorker::new("a", factory_log.clone()).with_delay(Duration::from_millis(20))
    });

    let handle = engine.worker(&id("t/a")).await.unwrap();
    let report = with_timeout(engine.execute(&handle)).await;

    assert_eq!(report.result, TaskResult::Succeeded);
    assert_eq!(
        *log.lock().unwrap(),
        ["a:preprocess", "a:process", "a:postprocess"]
    );
}

#[tokio::test]
async fn run_async_process_failure_is_captured() {
    init_tracing();
    let log = phase_log();
    let factory_log = log.clone();
    let engine = engine_with_worker(code_meta("t/a").run_async(), move || {
        ProbeWorker::new("a", factory_log.clone()).fail_process()
    });

    let handle = engine.worker(&id("t/a")).await.unwrap();
    let report = with_timeout(engine.execute(&handle)).await;

    assert_eq!(report.result, TaskResult::Failed);
    assert_eq!(
        *log.lock().unwrap(),
        ["a:preprocess", "a:process", "a:postprocess"]
    );
}

#[tokio::test]
async fn inline_process_panic_is_captured_and_postprocess_still_runs() {
    init_tracing();
    let log = phase_log();
    let factory_log = log.clone();
    let engine = engine_with_worker(code_meta("t/a"), move || {
        ProbeWorker::new("a", factory_log.clone()).panic_process()
    });

    let handle = engine.worker(&id("t/a")).await.unwrap();
    let report = with_timeout(engine.execute(&handle)).await;

    assert_eq!(report.result, TaskResult::Failed);
    assert!(report.error.contains("panicked"), "error: {}", report.error);
    assert_eq!(
        *log.lock().unwrap(),
        ["a:preprocess", "a:process", "a:postprocess"]
    );
}

#[tokio::test]
async fn process_panic_does_not_wedge_the_singleton_gate() {
    init_tracing();
    let log = phase_log();
    let factory_log = log.clone();
    let engine = engine_with_worker(code_meta("t/a").singleton(), move || {
        ProbeWorker::new("a", factory_log.clone()).panic_process()
    });

    let handle = engine.worker(&id("t/a")).await.unwrap();
    let first = with_timeout(engine.execute(&handle)).await;
    assert_eq!(first.result, TaskResult::Failed);
    assert!(first.error.contains("panicked"), "error: {}", first.error);

    // A later execute must run the worker again, not fail over on a stale
    // in-flight entry.
    let second = with_timeout(engine.execute(&handle)).await;
    assert_eq!(second.result, TaskResult::Failed);
    assert!(second.error.contains("panicked"), "error: {}", second.error);
    assert_eq!(log.lock().unwrap().len(), 6);
}

#[tokio::test]
async fn background_process_panic_is_captured() {
    init_tracing();
    let log = phase_log();
    let factory_log = log.clone();
    let engine = engine_with_worker(code_meta("t/a").run_async(), move || {
        ProbeWorker::new("a", factory_log.clone()).panic_process()
    });

    let handle = engine.worker(&id("t/a")).await.unwrap();
    let report = with_timeout(engine.execute(&handle)).await;

    assert_eq!(report.result, TaskResult::Failed);
    assert!(report.error.contains("panicked"), "error: {}", report.error);
    assert!(log.lock().unwrap().contains(&"a:postprocess".to_string()));
}

#[tokio::test]
async fn timestamps_are_consistent() {
    init_tracing();
    let log = phase_log();
    let factory_log = log.clone();
    let engine = engine_with_worker(code_meta("t/a"), move || {
        ProbeWorker::new("a", factory_log.clone()).with_delay(Duration::from_millis(10))
    });

    let handle = engine.worker(&id("t/a")).await.unwrap();
    let report = with_timeout(engine.execute(&handle)).await;

    let finished = report.finished_at.expect("finished_at must be set");
    assert!(finished >= report.started_at);
    assert!(report.elapsed() >= chrono::TimeDelta::zero());
}

#[tokio::test]
async fn param_overrides_reach_the_worker() {
    init_tracing();
    let engine = Engine::new();
    engine.add_provider(taskdock::exec::builtin::register);
    engine.parse(&ParseOptions::new()).unwrap();

    engine.set_param(
        &id("dock/echo"),
        "message",
        ParamValue::Str("custom message".into()),
    );

    let handle = engine.worker(&id("dock/echo")).await.unwrap();
    let report = with_timeout(engine.execute(&handle)).await;

    assert_eq!(report.result, TaskResult::Succeeded);
    assert_eq!(
        report.extras.get("message").map(String::as_str),
        Some("custom message")
    );
}
