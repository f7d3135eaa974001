//! Dependency resolution: plan ordering, deduplication and error cases.

use taskdock::engine::Engine;
use taskdock::errors::TaskdockError;
use taskdock::meta::TaskMeta;
use taskdock::registry::{CodeTasks, ParseOptions};

use taskdock_test_utils::builders::{code_meta, id};
use taskdock_test_utils::init_tracing;
use taskdock_test_utils::workers::NoopWorker;

fn engine_with(metas: Vec<TaskMeta>) -> Engine {
    let engine = Engine::new();
    engine.add_provider(move |tasks: &mut CodeTasks| {
        for meta in &metas {
            tasks.declare(meta.clone(), || NoopWorker);
        }
    });
    engine.parse(&ParseOptions::new()).unwrap();
    engine
}

fn plan_strings(engine: &Engine, target: &str) -> Vec<String> {
    engine
        .resolve(&id(target))
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[test]
fn pre_then_self_then_post() {
    init_tracing();
    let engine = engine_with(vec![
        code_meta("build/prepare"),
        code_meta("build/cleanup"),
        code_meta("build/app")
            .with_pre(id("build/prepare"))
            .with_post(id("build/cleanup")),
    ]);

    assert_eq!(
        plan_strings(&engine, "build/app"),
        ["build/prepare", "build/app", "build/cleanup"]
    );
}

#[test]
fn pre_dependencies_keep_declared_order() {
    init_tracing();
    let engine = engine_with(vec![
        code_meta("build/b"),
        code_meta("build/a"),
        code_meta("build/app")
            .with_pre(id("build/b"))
            .with_pre(id("build/a")),
    ]);

    assert_eq!(
        plan_strings(&engine, "build/app"),
        ["build/b", "build/a", "build/app"]
    );
}

#[test]
fn diamond_dependency_runs_once_at_first_required_position() {
    init_tracing();
    let engine = engine_with(vec![
        code_meta("build/base"),
        code_meta("build/left").with_pre(id("build/base")),
        code_meta("build/right").with_pre(id("build/base")),
        code_meta("build/app")
            .with_pre(id("build/left"))
            .with_pre(id("build/right")),
    ]);

    assert_eq!(
        plan_strings(&engine, "build/app"),
        ["build/base", "build/left", "build/right", "build/app"]
    );
}

#[test]
fn transitive_pre_and_post_expand_recursively() {
    init_tracing();
    let engine = engine_with(vec![
        code_meta("build/fetch"),
        code_meta("build/compile").with_pre(id("build/fetch")),
        code_meta("build/report"),
        code_meta("build/package")
            .with_pre(id("build/compile"))
            .with_post(id("build/report")),
    ]);

    assert_eq!(
        plan_strings(&engine, "build/package"),
        ["build/fetch", "build/compile", "build/package", "build/report"]
    );
}

#[test]
fn cycles_are_reported_with_their_members() {
    init_tracing();
    let engine = engine_with(vec![
        code_meta("build/a").with_pre(id("build/b")),
        code_meta("build/b").with_pre(id("build/a")),
    ]);

    let err = engine.resolve(&id("build/a")).unwrap_err();
    match err {
        TaskdockError::DependencyCycle(members) => {
            assert!(members.contains("build/a"), "members: {members}");
            assert!(members.contains("build/b"), "members: {members}");
            assert!(members.contains(" -> "), "members: {members}");
        }
        other => panic!("expected DependencyCycle, got {other:?}"),
    }
}

#[test]
fn self_cycle_is_detected() {
    init_tracing();
    let engine = engine_with(vec![code_meta("build/a").with_pre(id("build/a"))]);
    let err = engine.resolve(&id("build/a")).unwrap_err();
    assert!(matches!(err, TaskdockError::DependencyCycle(_)));
}

#[test]
fn unknown_dependency_names_the_referencing_task() {
    init_tracing();
    let engine = engine_with(vec![code_meta("build/app").with_pre(id("build/ghost"))]);

    let err = engine.resolve(&id("build/app")).unwrap_err();
    match err {
        TaskdockError::UnknownDependency {
            dependency,
            referenced_by,
        } => {
            assert_eq!(dependency, id("build/ghost"));
            assert_eq!(referenced_by, id("build/app"));
        }
        other => panic!("expected UnknownDependency, got {other:?}"),
    }
}

#[test]
fn resolving_an_unknown_target_is_not_found() {
    init_tracing();
    let engine = engine_with(vec![code_meta("build/app")]);
    let err = engine.resolve(&id("build/ghost")).unwrap_err();
    assert!(matches!(err, TaskdockError::TaskNotFound(_)));
}

#[test]
fn find_accepts_unique_bare_names_and_rejects_ambiguous_ones() {
    init_tracing();
    let engine = engine_with(vec![
        code_meta("build/app"),
        code_meta("deploy/app"),
        code_meta("build/unique"),
    ]);

    assert_eq!(engine.find("build/app").unwrap(), id("build/app"));
    assert_eq!(engine.find("unique").unwrap(), id("build/unique"));
    assert!(matches!(
        engine.find("app").unwrap_err(),
        TaskdockError::Config(_)
    ));
}
