//! Bootstrap tests running whole passes against a temporary directory.

use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use paas_config::{Config, WorkloadKind};
use paas_engine::{PassState, WorkloadPlan};
use rstest::{fixture, rstest};
use tempfile::TempDir;

use crate::collaborators::{PLAN_FILE, SCRAPE_JOBS_FILE};
use crate::{BootstrapError, StaticConfigLoader, StructuredHealthReporter, bootstrap_with};

struct Deployment {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Deployment {
    fn config(&self) -> Config {
        Config {
            workload_kind: WorkloadKind::Flask,
            app_name: String::from("shop"),
            snapshot_path: self.root.join("snapshot.json"),
            secrets_dir: self.root.join("secrets"),
            output_dir: self.root.join("out"),
            customization_path: self.root.join("paas-config.yaml"),
            ..Config::default()
        }
    }

    fn write(&self, name: &str, contents: &str) {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture directory");
        }
        fs::write(path, contents).expect("write fixture");
    }

    fn output(&self, name: &str) -> String {
        fs::read_to_string(self.root.join("out").join(name)).expect("output written")
    }
}

#[fixture]
fn deployment() -> Deployment {
    let dir = TempDir::new().expect("create temp dir");
    let root = Utf8Path::from_path(dir.path())
        .expect("temp dir is UTF-8")
        .to_owned();
    Deployment { _dir: dir, root }
}

#[rstest]
fn bootstrap_prepares_output_directory(deployment: Deployment) {
    let loader = StaticConfigLoader::new(deployment.config());
    let daemon = bootstrap_with(&loader, Arc::new(StructuredHealthReporter::new()))
        .expect("bootstrap succeeds");
    assert!(daemon.config().output_dir().is_dir());
    assert_eq!(daemon.engine().state(), PassState::Idle);
}

#[rstest]
fn unknown_required_integration_fails_bootstrap(deployment: Deployment) {
    let config = Config {
        required_integrations: Some(String::from("postgresql,kafka")),
        ..deployment.config()
    };
    let loader = StaticConfigLoader::new(config);
    let result = bootstrap_with(&loader, Arc::new(StructuredHealthReporter::new()));
    assert!(matches!(result, Err(BootstrapError::Catalog { .. })));
}

#[rstest]
fn pass_writes_plan_with_resolved_secrets(deployment: Deployment) {
    deployment.write(
        "snapshot.json",
        r#"{
            "options": {"flask-secret-key-id": {"secret": "session-key"}},
            "integrations": {"redis": {"fields": {"url": "redis://10.0.0.7:6379"}}},
            "units": [{"name": "shop/0", "address": "10.0.0.1", "ready": true}]
        }"#,
    );
    deployment.write("secrets/session-key.json", r#"{"value": "s3cr3t"}"#);
    deployment.write(
        "paas-config.yaml",
        "prometheus:\n  scrape_configs:\n    - job_name: workers\n      static_configs:\n        - targets: [\"*:9808\"]\n",
    );
    let loader = StaticConfigLoader::new(deployment.config());
    let mut daemon = bootstrap_with(&loader, Arc::new(StructuredHealthReporter::new()))
        .expect("bootstrap succeeds");

    let report = daemon.engine_mut().run_pass();
    assert!(report.is_applied(), "pass failed: {:?}", report.error());

    let plan: WorkloadPlan =
        serde_json::from_str(&deployment.output(PLAN_FILE)).expect("plan parses");
    assert_eq!(plan.config.get("FLASK_SECRET_KEY"), Some("s3cr3t"));
    assert_eq!(
        plan.config.get("REDIS_DB_CONNECT_STRING"),
        Some("redis://10.0.0.7:6379")
    );
    assert!(plan.services.get("shop-worker").is_some());

    let jobs: serde_json::Value =
        serde_json::from_str(&deployment.output(SCRAPE_JOBS_FILE)).expect("jobs parse");
    assert_eq!(jobs[0]["job_name"], "app-metrics");
    assert_eq!(jobs[0]["static_configs"][0]["targets"][0], "10.0.0.1:9102");
    assert_eq!(jobs[1]["static_configs"][0]["targets"][0], "10.0.0.1:9808");

    let again = daemon.engine_mut().run_pass();
    assert!(again.is_applied());
    assert!(again.error().is_none());
}

#[rstest]
fn missing_snapshot_fails_the_pass(deployment: Deployment) {
    let loader = StaticConfigLoader::new(deployment.config());
    let mut daemon = bootstrap_with(&loader, Arc::new(StructuredHealthReporter::new()))
        .expect("bootstrap succeeds");
    let report = daemon.engine_mut().run_pass();
    assert_eq!(report.state, PassState::Failed);
    assert_eq!(report.error().map(|error| error.category()), Some("orchestrator"));
}
