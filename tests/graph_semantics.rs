//! Execution semantics of series/parallel compositions, driven through a
//! real project in a temp directory.

use std::fs;
use std::path::Path;

use pipeforge::config::StepConfig;
use pipeforge::errors::{GraphError, TaskError};
use pipeforge::project::Project;
use pipeforge_test_utils::builders::{
    parallel_task, series_task, ConfigFileBuilder, PipelineConfigBuilder,
};

/// Project layout:
/// - `ok.css`            well-formed stylesheet
/// - `bad.html`          malformed markup (validate-html fails)
/// - `blob.bin`          binary data (replace fails)
fn write_sources(root: &Path) {
    fs::write(root.join("ok.css"), "body { color: red; }\n").unwrap();
    fs::write(root.join("bad.html"), "<html><body></html>").unwrap();
    fs::write(root.join("blob.bin"), [0xff, 0xfe, 0x00]).unwrap();
}

fn project(dir: &Path) -> Project {
    write_sources(dir);

    let cfg = ConfigFileBuilder::new()
        .with_pipeline(
            "validate",
            PipelineConfigBuilder::new()
                .src("*.html")
                .step(StepConfig::ValidateHtml)
                .dest("dist-html")
                .build(),
        )
        .with_pipeline(
            "styles",
            PipelineConfigBuilder::new()
                .src("*.css")
                .dest("dist-css")
                .build(),
        )
        .with_pipeline(
            "broken-replace",
            PipelineConfigBuilder::new()
                .src("*.bin")
                .step(StepConfig::Replace {
                    pattern: "a".into(),
                    replacement: "b".into(),
                })
                .dest("dist-bin")
                .build(),
        )
        .with_task("build", series_task(&["validate", "styles"]))
        .with_task("fanout", parallel_task(&["validate", "broken-replace"]))
        .with_task("both", parallel_task(&["styles", "validate"]))
        .build();

    Project::from_config(&cfg, dir).unwrap()
}

#[tokio::test]
async fn series_stops_at_first_failure_and_reports_it() {
    let dir = tempfile::tempdir().unwrap();
    let project = project(dir.path());

    let err = project.execute("build").await.unwrap_err();

    // Exactly the failing member's error, not a composite wrapper.
    match err {
        TaskError::Pipeline { ref task, ref source } => {
            assert_eq!(task, "validate");
            assert_eq!(source.step, "validate-html");
        }
        other => panic!("expected the validate member's error, got {other:?}"),
    }

    // The later member never started: no styles output was written.
    assert!(!dir.path().join("dist-css").exists());
    assert!(!dir.path().join("dist-html").exists());
}

#[tokio::test]
async fn parallel_reports_every_member_failure() {
    let dir = tempfile::tempdir().unwrap();
    let project = project(dir.path());

    let err = project.execute("fanout").await.unwrap_err();

    match &err {
        TaskError::Parallel { task, errors } => {
            assert_eq!(task, "fanout");
            assert_eq!(errors.len(), 2);
        }
        other => panic!("expected a parallel composite failure, got {other:?}"),
    }

    let mut steps: Vec<&str> = err
        .leaves()
        .iter()
        .map(|leaf| match leaf {
            TaskError::Pipeline { source, .. } => source.step,
            other => panic!("unexpected leaf {other:?}"),
        })
        .collect();
    steps.sort_unstable();
    assert_eq!(steps, vec!["replace", "validate-html"]);
}

#[tokio::test]
async fn parallel_failure_does_not_crash_sibling_pipelines() {
    let dir = tempfile::tempdir().unwrap();
    let project = project(dir.path());

    // `styles` succeeds even though its sibling `validate` fails.
    let err = project.execute("both").await.unwrap_err();
    assert!(matches!(err, TaskError::Parallel { .. }));
    assert!(dir.path().join("dist-css/ok.css").exists());
}

#[tokio::test]
async fn unknown_task_fails_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let project = project(dir.path());

    let err = project.execute("nope").await.unwrap_err();
    assert!(matches!(
        err,
        TaskError::Graph(GraphError::UnknownTask(ref name)) if name == "nope"
    ));
}

#[tokio::test]
async fn cyclic_graph_fails_before_any_pipeline_executes() {
    let dir = tempfile::tempdir().unwrap();
    write_sources(dir.path());

    // Assemble directly (bypassing config validation) so resolution-time
    // cycle detection is what gets exercised.
    let cfg = ConfigFileBuilder::new()
        .with_pipeline(
            "styles",
            PipelineConfigBuilder::new()
                .src("*.css")
                .dest("dist-css")
                .build(),
        )
        .with_task("a", series_task(&["styles", "b"]))
        .with_task("b", series_task(&["a"]))
        .build();
    let project = Project::from_config(&cfg, dir.path()).unwrap();

    let err = project.execute("a").await.unwrap_err();
    assert!(matches!(
        err,
        TaskError::Graph(GraphError::CyclicDependency { .. })
    ));

    // Resolution failed up front: the styles pipeline never ran.
    assert!(!dir.path().join("dist-css").exists());
}

#[tokio::test]
async fn rerunning_a_task_is_safe_and_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let project = project(dir.path());

    project.execute("styles").await.unwrap();
    let first = fs::read(dir.path().join("dist-css/ok.css")).unwrap();

    project.execute("styles").await.unwrap();
    let second = fs::read(dir.path().join("dist-css/ok.css")).unwrap();

    assert_eq!(first, second);
}
