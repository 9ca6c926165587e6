//! Unit tests for the service plan builder.

use paas_config::WorkloadKind;
use rstest::{fixture, rstest};

use super::*;
use crate::catalog::Catalog;
use crate::integration::RawIntegrationData;
use crate::tests::{postgresql_data, redis_data, text};

struct Inputs {
    kind: WorkloadKind,
    config: RuntimeConfig,
    integrations: BTreeMap<String, RawIntegrationData>,
    request: ServiceRequest,
    options: BTreeMap<String, OptionValue>,
}

impl Inputs {
    fn with_broker(mut self) -> Self {
        self.integrations.insert(String::from("redis"), redis_data());
        self
    }

    fn build(&self) -> Result<ServicePlan, ReconcileError> {
        let catalog = Catalog::for_workload(self.kind);
        let integrations = IntegrationSet::read(&catalog, &self.integrations);
        build_plan(&PlanInput {
            profile: WorkloadProfile::for_kind(self.kind),
            app_name: "shop",
            config: &self.config,
            integrations: &integrations,
            request: &self.request,
            options: &self.options,
        })
    }
}

#[fixture]
fn flask() -> Inputs {
    Inputs {
        kind: WorkloadKind::Flask,
        config: [("FLASK_BASE_URL", "http://shop:8000")].into_iter().collect(),
        integrations: BTreeMap::new(),
        request: ServiceRequest::default(),
        options: BTreeMap::new(),
    }
}

fn names(plan: &ServicePlan) -> Vec<&str> {
    plan.iter().map(|service| service.name.as_str()).collect()
}

#[rstest]
fn web_service_is_always_planned(flask: Inputs) {
    let plan = flask.build().expect("plan builds");
    assert_eq!(names(&plan), vec!["shop"]);
    let web = plan.by_role(ServiceRole::Web).expect("web service");
    assert_eq!(
        web.command,
        "/bin/python3 -m gunicorn -c /flask/gunicorn.conf.py app:app -k sync"
    );
    assert_eq!(web.run_as_user, "_daemon_");
    assert_eq!(web.working_directory, "/flask/app");
    assert_eq!(web.environment.get("FLASK_BASE_URL"), Some("http://shop:8000"));
    assert!(web.enabled_at_startup);
    assert!(!web.singleton);
}

#[rstest]
fn ready_broker_adds_default_worker_and_scheduler(flask: Inputs) {
    let plan = flask.with_broker().build().expect("plan builds");
    assert_eq!(names(&plan), vec!["shop", "shop-scheduler", "shop-worker"]);
    let scheduler = plan.by_role(ServiceRole::Scheduler).expect("scheduler");
    assert!(scheduler.singleton);
    assert!(scheduler.command.contains("beat"));
    let worker = plan.by_role(ServiceRole::Worker).expect("worker");
    assert!(!worker.singleton);
}

#[rstest]
fn declared_worker_only_skips_scheduler(mut flask: Inputs) {
    flask.request.worker = Some(String::from("celery -A app worker"));
    let plan = flask.with_broker().build().expect("plan builds");
    assert_eq!(names(&plan), vec!["shop", "shop-worker"]);
    assert_eq!(
        plan.get("shop-worker").map(|service| service.command.as_str()),
        Some("celery -A app worker")
    );
}

#[rstest]
fn scheduler_without_worker_is_a_conflict(mut flask: Inputs) {
    flask.request.scheduler = Some(String::from("celery -A app beat"));
    let error = flask.with_broker().build().expect_err("conflict");
    assert_eq!(error.category(), "plan_conflict");
}

#[rstest]
fn scheduler_without_worker_conflicts_even_without_broker(mut flask: Inputs) {
    flask.request.scheduler = Some(String::from("celery -A app beat"));
    assert!(matches!(
        flask.build(),
        Err(ReconcileError::PlanConflict { .. })
    ));
}

#[rstest]
fn non_broker_integrations_do_not_add_a_worker(mut flask: Inputs) {
    flask
        .integrations
        .insert(String::from("postgresql"), postgresql_data());
    let plan = flask.build().expect("plan builds");
    assert_eq!(plan.len(), 1);
}

#[test]
fn go_rejects_declared_worker() {
    let inputs = Inputs {
        kind: WorkloadKind::Go,
        config: RuntimeConfig::new(),
        integrations: BTreeMap::new(),
        request: ServiceRequest {
            worker: Some(String::from("/usr/local/bin/worker")),
            scheduler: None,
        },
        options: BTreeMap::new(),
    };
    assert!(matches!(
        inputs.with_broker().build(),
        Err(ReconcileError::PlanConflict { .. })
    ));
}

#[test]
fn fastapi_without_declaration_runs_web_only() {
    let inputs = Inputs {
        kind: WorkloadKind::Fastapi,
        config: RuntimeConfig::new(),
        integrations: BTreeMap::new(),
        request: ServiceRequest::default(),
        options: BTreeMap::new(),
    }
    .with_broker();
    let plan = inputs.build().expect("plan builds");
    assert_eq!(names(&plan), vec!["shop"]);
    assert_eq!(
        plan.get("shop").map(|service| service.command.as_str()),
        Some("/bin/python3 -m uvicorn app:app")
    );
}

#[rstest]
#[case::sync("sync")]
#[case::gevent("gevent")]
fn allowed_worker_classes_reach_the_command(mut flask: Inputs, #[case] class: &str) {
    flask.options.insert(WORKER_CLASS_OPTION.to_owned(), text(class));
    let plan = flask.build().expect("plan builds");
    let web = plan.get("shop").expect("web service");
    assert!(web.command.ends_with(&format!("-k {class}")));
}

#[rstest]
fn unknown_worker_class_names_the_option(mut flask: Inputs) {
    flask
        .options
        .insert(WORKER_CLASS_OPTION.to_owned(), text("eventlet"));
    let Err(ReconcileError::Validation(error)) = flask.build() else {
        panic!("worker class must be rejected");
    };
    assert_eq!(error.path(), WORKER_CLASS_OPTION);
    assert_eq!(error.message(), "Only 'gevent' and 'sync' are allowed.");
}

#[test]
fn worker_class_is_rejected_outside_gunicorn() {
    let mut options = BTreeMap::new();
    options.insert(WORKER_CLASS_OPTION.to_owned(), text("sync"));
    let inputs = Inputs {
        kind: WorkloadKind::Expressjs,
        config: RuntimeConfig::new(),
        integrations: BTreeMap::new(),
        request: ServiceRequest::default(),
        options,
    };
    assert_eq!(
        inputs.build().map_err(|error| error.category()),
        Err("validation")
    );
}

#[rstest]
fn plans_are_deterministic(flask: Inputs) {
    let inputs = flask.with_broker();
    let first = serde_json::to_string(&inputs.build().expect("plan builds")).expect("serialise");
    let second = serde_json::to_string(&inputs.build().expect("plan builds")).expect("serialise");
    assert_eq!(first, second);
}
