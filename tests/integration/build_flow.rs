//! End-to-end build flow tests over real project directories.

use std::error::Error as _;

use wharf::output::render_tree;
use wharf::service::{ContextOverride, OperationConfig};
use wharf::tracker::{Task, TaskState};
use wharf::{Builder, Error};

use crate::fixtures::{ServiceSpec, TestProject};

fn build_node(root: &Task, service: &str) -> Task {
    root.find_child(service)
        .and_then(|t| t.find_child("Build"))
        .expect("Build node")
}

#[test]
fn test_build_all_services_in_order() {
    let project = TestProject::new(&[
        ServiceSpec::new("api", "./build.sh"),
        ServiceSpec::new("web", "touch web-built.txt"),
    ]);
    project.write_script("api", "build.sh", "touch api-built.txt");

    let config = project.load();
    let cfg = OperationConfig::new(&project.path);
    let overrides = ContextOverride::new();
    let builder = Builder::new(&cfg, &overrides);
    let root = Task::root("build");

    builder.build(&root, &config.services).unwrap();

    assert_eq!(build_node(&root, "api").state(), TaskState::Success);
    assert_eq!(build_node(&root, "web").state(), TaskState::Success);
    assert!(project.service_file("api", "api-built.txt").exists());
    assert!(project.service_file("web", "web-built.txt").exists());

    let names: Vec<String> = root.children().iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["api", "web"]);
}

#[test]
fn test_service_without_build_step_is_skipped() {
    let project = TestProject::new(&[
        ServiceSpec::new("db", "").with_launch("./run-db.sh"),
        ServiceSpec::new("api", "touch built.txt"),
    ]);

    let config = project.load();
    let cfg = OperationConfig::new(&project.path);
    let overrides = ContextOverride::new();
    let builder = Builder::new(&cfg, &overrides);
    let root = Task::root("build");

    builder.build(&root, &config.services).unwrap();

    let db = root.find_child("db").expect("db child");
    assert!(db.children().is_empty());
    assert_eq!(build_node(&root, "api").state(), TaskState::Success);
}

#[test]
fn test_excluded_service_is_silently_skipped() {
    let project = TestProject::new(&[
        ServiceSpec::new("api", "touch api-built.txt"),
        ServiceSpec::new("web", "touch web-built.txt"),
    ]);

    let config = project.load();
    let cfg = OperationConfig::new(&project.path).with_exclusions(vec!["api".to_string()]);
    let overrides = ContextOverride::new();
    let builder = Builder::new(&cfg, &overrides);
    let root = Task::root("build");

    builder.build(&root, &config.services).unwrap();

    assert!(root.find_child("api").is_none());
    assert!(!project.service_file("api", "api-built.txt").exists());
    assert_eq!(build_node(&root, "web").state(), TaskState::Success);
}

#[test]
fn test_running_service_is_skipped_with_warning() {
    let project = TestProject::new(&[ServiceSpec::new("api", "touch built.txt")]);
    project.mark_running("api", 4242);

    let config = project.load();
    let cfg = OperationConfig::new(&project.path);
    let overrides = ContextOverride::new();
    let builder = Builder::new(&cfg, &overrides);
    let root = Task::root("build");

    builder.build(&root, &config.services).unwrap();

    let job = build_node(&root, "api");
    assert_eq!(job.state(), TaskState::Warning);
    assert_eq!(job.messages(), vec!["Already running"]);
    assert!(!project.service_file("api", "built.txt").exists());
}

#[test]
fn test_force_rebuilds_running_service() {
    let project = TestProject::new(&[ServiceSpec::new("api", "touch built.txt")]);
    project.mark_running("api", 4242);

    let config = project.load();
    let cfg = OperationConfig::new(&project.path);
    let overrides = ContextOverride::new();
    let builder = Builder::new(&cfg, &overrides);
    let root = Task::root("build");

    let service = config.service("api").unwrap();
    builder.build_sync(&root, service, true).unwrap();

    assert_eq!(build_node(&root, "api").state(), TaskState::Success);
    assert!(project.service_file("api", "built.txt").exists());
}

#[test]
fn test_failure_stops_later_services() {
    let project = TestProject::new(&[
        ServiceSpec::new("a", "true"),
        ServiceSpec::new("b", "sh -c 'echo broken dependency >&2 && exit 3'"),
        ServiceSpec::new("c", "touch c-built.txt"),
    ]);

    let config = project.load();
    let cfg = OperationConfig::new(&project.path);
    let overrides = ContextOverride::new();
    let builder = Builder::new(&cfg, &overrides);
    let root = Task::root("build");

    let err = builder.build(&root, &config.services).unwrap_err();
    assert_eq!(format!("{}", err), "running build command");
    assert!(matches!(err, Error::BuildCommand(_)));
    let cause = err.source().expect("cause").to_string();
    assert!(cause.contains("exited with"));

    assert_eq!(build_node(&root, "a").state(), TaskState::Success);
    let failed = build_node(&root, "b");
    assert_eq!(failed.state(), TaskState::Failed);
    assert!(failed.messages()[1].contains("broken dependency"));
    assert!(root.find_child("c").is_none());
    assert!(!project.service_file("c", "c-built.txt").exists());
}

#[test]
fn test_env_override_reaches_build_command() {
    let project = TestProject::new(&[ServiceSpec::new("api", "touch $MARKER")]);

    let config = project.load();
    let cfg = OperationConfig::new(&project.path);
    let mut overrides = ContextOverride::new();
    overrides.set_env("MARKER", "override-built.txt");
    let builder = Builder::new(&cfg, &overrides);
    let root = Task::root("build");

    builder.build(&root, &config.services).unwrap();
    assert!(project.service_file("api", "override-built.txt").exists());
}

#[test]
fn test_rendered_tree_reflects_outcomes() {
    let project = TestProject::new(&[
        ServiceSpec::new("api", "true"),
        ServiceSpec::new("web", "true"),
    ]);
    project.mark_running("web", 777);

    let config = project.load();
    let cfg = OperationConfig::new(&project.path);
    let overrides = ContextOverride::new();
    let builder = Builder::new(&cfg, &overrides);
    let root = Task::root("build");

    builder.build(&root, &config.services).unwrap();

    let rendered = render_tree(&root);
    assert!(rendered.contains("✓ Build"));
    assert!(rendered.contains("⚠ Build (Already running)"));
}
