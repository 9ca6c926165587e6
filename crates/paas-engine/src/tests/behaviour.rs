//! Behaviour-driven tests for the reconciler lifecycle.

use std::sync::{Arc, Mutex, PoisonError};

use paas_config::WorkloadKind;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::catalog::IntegrationKind;
use crate::error::{OrchestratorError, ReconcileError};
use crate::integration::RawIntegrationData;
use crate::reconciler::{
    Applied, ApplyOutcome, Collaborators, EngineSettings, Orchestrator, PassOutcome, PassReport,
    Reconciler, StructuredReconcileReporter,
};
use crate::snapshot::WorldSnapshot;

use super::{
    NoOpDetectingMetrics, NoOpDetectingSupervisor, StaticSecrets, mysql_data, postgresql_data,
    redis_data,
};

// ---------------------------------------------------------------------------
// Test world
// ---------------------------------------------------------------------------

/// Orchestrator double exposing a snapshot the steps can edit.
#[derive(Clone, Default)]
struct SharedWorld {
    snapshot: Arc<Mutex<WorldSnapshot>>,
}

impl SharedWorld {
    fn edit(&self, change: impl FnOnce(&mut WorldSnapshot)) {
        let mut snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        change(&mut snapshot);
    }
}

impl Orchestrator for SharedWorld {
    fn snapshot(&self) -> Result<WorldSnapshot, OrchestratorError> {
        Ok(self
            .snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

type Engine = Reconciler<
    SharedWorld,
    StaticSecrets,
    NoOpDetectingSupervisor,
    NoOpDetectingMetrics,
    StructuredReconcileReporter,
>;

#[derive(Default)]
struct TestWorld {
    settings: Option<EngineSettings>,
    orchestrator: SharedWorld,
    engine: Option<Engine>,
    report: Option<PassReport>,
}

#[fixture]
fn world() -> TestWorld {
    TestWorld::default()
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn integration_data(name: &str) -> RawIntegrationData {
    match name {
        "postgresql" => postgresql_data(),
        "mysql" => mysql_data(),
        "redis" => redis_data(),
        other => panic!("no ready data for integration '{other}'"),
    }
}

fn engine(world: &mut TestWorld) -> &mut Engine {
    let settings = world.settings.clone().expect("workload configured");
    let orchestrator = world.orchestrator.clone();
    world.engine.get_or_insert_with(|| {
        Reconciler::new(
            settings,
            Collaborators {
                orchestrator,
                secrets: StaticSecrets::default(),
                supervisor: NoOpDetectingSupervisor::default(),
                metrics: NoOpDetectingMetrics::default(),
            },
            StructuredReconcileReporter::new(),
        )
        .expect("engine builds")
    })
}

fn report(world: &TestWorld) -> &PassReport {
    world.report.as_ref().expect("a pass has run")
}

fn supervisor(world: &TestWorld) -> &NoOpDetectingSupervisor {
    &world.engine.as_ref().expect("engine built").collaborators().supervisor
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("a {kind} workload named {name}")]
fn given_workload(world: &mut TestWorld, kind: String, name: String) {
    let parsed: WorkloadKind = kind.trim_matches('"').parse().expect("workload kind");
    world.settings = Some(EngineSettings {
        kind: parsed,
        app_name: name.trim_matches('"').to_owned(),
        required_integrations: Vec::new(),
    });
}

#[given("the operator requires the {name} integration")]
fn given_required(world: &mut TestWorld, name: String) {
    let settings = world.settings.as_mut().expect("workload configured");
    settings
        .required_integrations
        .push(name.trim_matches('"').to_owned());
}

#[given("the {name} integration is pending")]
fn given_pending(world: &mut TestWorld, name: String) {
    mark_pending(world, &name);
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

#[when("a pass runs")]
fn when_pass_runs(world: &mut TestWorld) {
    let pass = engine(world).run_pass();
    world.report = Some(pass);
}

#[when("the {name} integration becomes ready")]
fn when_ready(world: &mut TestWorld, name: String) {
    let integration = name.trim_matches('"').to_owned();
    let data = integration_data(&integration);
    world.orchestrator.edit(|snapshot| {
        snapshot.integrations.insert(integration, data);
    });
}

#[when("the {name} integration becomes pending")]
fn when_pending(world: &mut TestWorld, name: String) {
    mark_pending(world, &name);
}

fn mark_pending(world: &mut TestWorld, name: &str) {
    let integration = name.trim_matches('"').to_owned();
    world.orchestrator.edit(|snapshot| {
        snapshot
            .integrations
            .insert(integration, RawIntegrationData::default());
    });
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("the pass is blocked by {name}")]
fn then_blocked(world: &mut TestWorld, name: String) {
    let expected = name.trim_matches('"');
    match report(world).error() {
        Some(ReconcileError::BlockedByIntegration { integration, .. }) => {
            assert_eq!(integration.as_str(), expected);
        }
        other => panic!("expected a blocked pass, got {other:?}"),
    }
}

#[then("the pass waits for a database")]
fn then_waits_for_database(world: &mut TestWorld) {
    match report(world).error() {
        Some(ReconcileError::BlockedByIntegrationGroup { candidates }) => {
            assert!(candidates.contains(&IntegrationKind::Postgresql));
            assert!(candidates.contains(&IntegrationKind::Mysql));
        }
        other => panic!("expected a pass waiting for a database, got {other:?}"),
    }
}

#[then("no plan has been applied")]
fn then_nothing_applied(world: &mut TestWorld) {
    assert!(supervisor(world).current().is_none());
    assert!(world.engine.as_ref().and_then(Engine::last_applied).is_none());
}

#[then("the applied plan count is {count}")]
fn then_applied_count(world: &mut TestWorld, count: usize) {
    assert_eq!(supervisor(world).changes(), count);
}

#[then("the last pass changed nothing")]
fn then_unchanged(world: &mut TestWorld) {
    assert_eq!(
        report(world).outcome,
        PassOutcome::Applied(Applied {
            supervisor: ApplyOutcome::Unchanged,
            metrics: ApplyOutcome::Unchanged,
        })
    );
}

#[then("the planned services are {names}")]
fn then_services(world: &mut TestWorld, names: String) {
    let plan = supervisor(world).current().expect("plan applied");
    let actual: Vec<String> = plan
        .services
        .iter()
        .map(|service| service.name.clone())
        .collect();
    assert_eq!(actual.join(","), names.trim_matches('"'));
}

// ---------------------------------------------------------------------------
// Scenario registration
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/reconciler_lifecycle.feature",
    name = "A database integration gates a django workload"
)]
fn database_gates_django(world: TestWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/reconciler_lifecycle.feature",
    name = "An operator-required integration gates application"
)]
fn required_integration_gates_application(world: TestWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/reconciler_lifecycle.feature",
    name = "An unchanged world is a no-op"
)]
fn unchanged_world_is_a_no_op(world: TestWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/reconciler_lifecycle.feature",
    name = "A ready task broker adds background services"
)]
fn ready_broker_adds_background_services(world: TestWorld) {
    drop(world);
}
