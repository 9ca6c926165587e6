//! Unit tests for the file-backed collaborators.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use paas_engine::secret::{SecretId, SecretStore};
use paas_engine::{ApplyOutcome, MetricsSink, Orchestrator, ProcessSupervisor, WorkloadPlan};
use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;

struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    fn write(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).expect("write fixture file");
        path
    }
}

#[fixture]
fn workspace() -> Workspace {
    let dir = TempDir::new().expect("create temp dir");
    let root = Utf8Path::from_path(dir.path())
        .expect("temp dir is UTF-8")
        .to_owned();
    Workspace { _dir: dir, root }
}

#[rstest]
fn snapshot_is_read_with_customization_file(workspace: Workspace) {
    let snapshot = workspace.write(
        "snapshot.json",
        r#"{"options": {"flask-debug": true}, "units": [{"name": "app/0", "address": "10.0.0.1", "ready": true}]}"#,
    );
    let customization = workspace.write("paas-config.yaml", "prometheus: {}\n");
    let orchestrator = FileOrchestrator::new(&snapshot, &customization);

    let world = orchestrator.snapshot().expect("snapshot reads");

    assert!(world.options.contains_key("flask-debug"));
    assert_eq!(world.units.units().len(), 1);
    assert_eq!(world.customization.as_deref(), Some("prometheus: {}\n"));
}

#[rstest]
fn missing_customization_file_is_not_an_error(workspace: Workspace) {
    let snapshot = workspace.write("snapshot.json", "{}");
    let orchestrator = FileOrchestrator::new(&snapshot, &workspace.path("absent.yaml"));
    let world = orchestrator.snapshot().expect("snapshot reads");
    assert!(world.customization.is_none());
}

#[rstest]
#[case::missing(None)]
#[case::malformed(Some("{\"options\": ["))]
#[case::unknown_field(Some("{\"unexpected\": 1}"))]
fn unreadable_snapshots_fail(workspace: Workspace, #[case] contents: Option<&str>) {
    let path = match contents {
        Some(text) => workspace.write("snapshot.json", text),
        None => workspace.path("snapshot.json"),
    };
    let orchestrator = FileOrchestrator::new(&path, &workspace.path("absent.yaml"));
    assert!(orchestrator.snapshot().is_err());
}

#[rstest]
fn secrets_are_read_per_identifier(workspace: Workspace) {
    workspace.write("db-password.json", r#"{"value": "hunter2"}"#);
    let store = DirectorySecretStore::new(&workspace.root);

    let content = store
        .fetch(&SecretId::new("db-password"))
        .expect("secret reads");
    assert_eq!(content.get("value").map(String::as_str), Some("hunter2"));
    assert!(store.fetch(&SecretId::new("missing")).is_err());
}

#[rstest]
#[case::parent("../outside")]
#[case::hidden(".hidden")]
#[case::nested("a/b")]
fn secret_identifiers_cannot_escape_the_directory(workspace: Workspace, #[case] id: &str) {
    let store = DirectorySecretStore::new(&workspace.root);
    let error = store.fetch(&SecretId::new(id)).expect_err("identifier rejected");
    assert!(error.to_string().contains("not a valid file name"));
}

#[rstest]
fn non_string_secret_values_are_rejected(workspace: Workspace) {
    workspace.write("token.json", r#"{"value": 42}"#);
    let store = DirectorySecretStore::new(&workspace.root);
    assert!(store.fetch(&SecretId::new("token")).is_err());
}

#[rstest]
fn plan_is_rewritten_only_when_it_changes(workspace: Workspace) {
    let supervisor = FileSupervisor::new(&workspace.root);
    let mut plan = WorkloadPlan::default();

    assert_eq!(supervisor.submit(&plan), Ok(ApplyOutcome::Changed));
    assert_eq!(supervisor.submit(&plan), Ok(ApplyOutcome::Unchanged));

    plan.config.insert("FLASK_DEBUG", "true");
    assert_eq!(supervisor.submit(&plan), Ok(ApplyOutcome::Changed));
    let written = fs::read_to_string(workspace.path(PLAN_FILE)).expect("plan written");
    assert!(written.contains("FLASK_DEBUG"));
}

#[rstest]
fn scrape_jobs_are_written_as_a_list(workspace: Workspace) {
    let sink = FileMetricsSink::new(&workspace.root);
    assert_eq!(sink.submit(&[]), Ok(ApplyOutcome::Changed));
    let written = fs::read_to_string(workspace.path(SCRAPE_JOBS_FILE)).expect("jobs written");
    assert_eq!(written, "[]\n");
    assert_eq!(sink.submit(&[]), Ok(ApplyOutcome::Unchanged));
}

#[rstest]
fn missing_output_directory_is_an_apply_error(workspace: Workspace) {
    let supervisor = FileSupervisor::new(&workspace.path("absent"));
    let error = supervisor
        .submit(&WorkloadPlan::default())
        .expect_err("write fails");
    assert_eq!(error.collaborator(), "supervisor");
}
