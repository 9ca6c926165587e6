//! Drives one reconciliation pass from observation to application.
//!
//! A pass moves through `Reading → Resolving → Building → Applying` and ends
//! in `Idle`, or in `Failed` when any stage rejects its input. Nothing reaches
//! the collaborators before `Applying`, and a pass that fails before the
//! supervisor accepts its plan never replaces the recorded desired state.
//!
//! The supervisor is submitted first. When the metrics collector then rejects
//! its targets the pass ends in `Failed` with a
//! [`PassOutcome::PartiallyApplied`] outcome, and the recorded desired state
//! pairs the running plan with the targets the collector still holds. The
//! next pass resubmits both; the supervisor reports the plan unchanged.

mod reporter;

use paas_config::WorkloadKind;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::catalog::{Catalog, WorkloadProfile};
use crate::customization;
use crate::error::{ApplyError, CatalogError, OrchestratorError, ReconcileError};
use crate::integration::IntegrationSet;
use crate::plan::{self, PlanInput, WorkloadPlan};
use crate::resolver::{self, Notice, ResolverInput};
use crate::scrape::{self, ScrapeTarget};
use crate::secret::{PassSecrets, SecretStore};
use crate::snapshot::WorldSnapshot;

pub use self::reporter::{ReconcileReporter, StructuredReconcileReporter};

/// Source of the world view read at the start of every pass.
pub trait Orchestrator {
    /// Returns the current world view.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] when the view cannot be read.
    fn snapshot(&self) -> Result<WorldSnapshot, OrchestratorError>;
}

/// Runs the planned services.
pub trait ProcessSupervisor {
    /// Submits the workload plan. Submitting an unchanged plan is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ApplyError`] when the supervisor rejects the plan.
    fn submit(&self, plan: &WorkloadPlan) -> Result<ApplyOutcome, ApplyError>;
}

/// Registers scrape targets with the metrics collector.
pub trait MetricsSink {
    /// Submits the full target set. Submitting an unchanged set is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ApplyError`] when the collector rejects the targets.
    fn submit(&self, targets: &[ScrapeTarget]) -> Result<ApplyOutcome, ApplyError>;
}

/// Whether a submission altered the collaborator's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApplyOutcome {
    /// The submission replaced the previous state.
    Changed,
    /// The submission matched the current state.
    Unchanged,
}

/// Stage of the reconciliation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PassState {
    /// Waiting for a trigger.
    Idle,
    /// Reading the world view.
    Reading,
    /// Resolving the runtime environment.
    Resolving,
    /// Building the service plan and scrape targets.
    Building,
    /// Submitting to the collaborators.
    Applying,
    /// The most recent pass failed.
    Failed,
}

/// Everything a successful pass hands to the collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredState {
    /// Environment and services for the process supervisor.
    pub plan: WorkloadPlan,
    /// Targets for the metrics collector.
    pub scrape_targets: Vec<ScrapeTarget>,
}

/// Collaborator responses to a successful pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    /// Process supervisor response.
    pub supervisor: ApplyOutcome,
    /// Metrics collector response.
    pub metrics: ApplyOutcome,
}

impl Applied {
    /// Whether either collaborator changed state.
    #[must_use]
    pub const fn changed(&self) -> bool {
        matches!(self.supervisor, ApplyOutcome::Changed)
            || matches!(self.metrics, ApplyOutcome::Changed)
    }
}

/// Result of one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// The desired state was submitted.
    Applied(Applied),
    /// The supervisor accepted the plan but the metrics collector rejected
    /// the targets.
    PartiallyApplied {
        /// Process supervisor response.
        supervisor: ApplyOutcome,
        /// Metrics collector failure.
        error: ReconcileError,
    },
    /// The pass stopped before anything was submitted, or the supervisor
    /// rejected the plan.
    Failed(ReconcileError),
}

/// Summary returned by [`Reconciler::run_pass`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// State the pass ended in.
    pub state: PassState,
    /// What the pass achieved.
    pub outcome: PassOutcome,
    /// Informational conditions raised while resolving.
    pub notices: Vec<Notice>,
}

impl PassReport {
    /// Whether the pass applied its desired state.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self.outcome, PassOutcome::Applied(_))
    }

    /// The failure, when the pass failed.
    #[must_use]
    pub const fn error(&self) -> Option<&ReconcileError> {
        match &self.outcome {
            PassOutcome::Failed(error) | PassOutcome::PartiallyApplied { error, .. } => Some(error),
            PassOutcome::Applied(_) => None,
        }
    }
}

/// Static engine settings fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Workload kind.
    pub kind: WorkloadKind,
    /// Application name.
    pub app_name: String,
    /// Integrations the operator marks as required on top of the profile.
    pub required_integrations: Vec<String>,
}

/// External systems a pass reads from and writes to.
#[derive(Debug)]
pub struct Collaborators<O, S, P, M> {
    /// World view source.
    pub orchestrator: O,
    /// Secret store.
    pub secrets: S,
    /// Process supervisor.
    pub supervisor: P,
    /// Metrics collector.
    pub metrics: M,
}

/// Owns the pass state machine and the last applied desired state.
pub struct Reconciler<O, S, P, M, R> {
    settings: EngineSettings,
    profile: &'static WorkloadProfile,
    catalog: Catalog,
    collaborators: Collaborators<O, S, P, M>,
    reporter: R,
    state: PassState,
    last_applied: Option<DesiredState>,
}

impl<O, S, P, M, R> Reconciler<O, S, P, M, R>
where
    O: Orchestrator,
    S: SecretStore,
    P: ProcessSupervisor,
    M: MetricsSink,
    R: ReconcileReporter,
{
    /// Creates an idle reconciler.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when a required integration name is unknown.
    pub fn new(
        settings: EngineSettings,
        collaborators: Collaborators<O, S, P, M>,
        reporter: R,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Catalog::for_workload(settings.kind);
        for name in &settings.required_integrations {
            catalog.require(name)?;
        }
        Ok(Self {
            profile: WorkloadProfile::for_kind(settings.kind),
            settings,
            catalog,
            collaborators,
            reporter,
            state: PassState::Idle,
            last_applied: None,
        })
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> PassState {
        self.state
    }

    /// Desired state the collaborators were last left holding.
    #[must_use]
    pub const fn last_applied(&self) -> Option<&DesiredState> {
        self.last_applied.as_ref()
    }

    /// Integration catalog in use.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Borrows the collaborators.
    #[must_use]
    pub const fn collaborators(&self) -> &Collaborators<O, S, P, M> {
        &self.collaborators
    }

    /// Runs one full pass to completion.
    pub fn run_pass(&mut self) -> PassReport {
        let mut notices = Vec::new();
        let outcome = match self.prepare(&mut notices) {
            Ok(desired) => self.apply(desired),
            Err(error) => {
                self.reporter.failed(self.state, &error);
                PassOutcome::Failed(error)
            }
        };
        let state = match outcome {
            PassOutcome::Applied(_) => PassState::Idle,
            PassOutcome::PartiallyApplied { .. } | PassOutcome::Failed(_) => PassState::Failed,
        };
        self.transition(state);
        PassReport {
            state,
            outcome,
            notices,
        }
    }

    fn transition(&mut self, next: PassState) {
        if self.state != next {
            self.reporter.transition(self.state, next);
            self.state = next;
        }
    }

    fn prepare(&mut self, notices: &mut Vec<Notice>) -> Result<DesiredState, ReconcileError> {
        self.transition(PassState::Reading);
        let snapshot = self.collaborators.orchestrator.snapshot()?;
        let integrations = IntegrationSet::read(&self.catalog, &snapshot.integrations);
        let document = customization::load(snapshot.customization.as_deref())?;

        self.transition(PassState::Resolving);
        let input = ResolverInput {
            profile: self.profile,
            app_name: &self.settings.app_name,
            context: &snapshot.context,
            topology: &snapshot.units,
            schema: &snapshot.option_schema,
            options: &snapshot.options,
            integrations: &integrations,
        };
        let mut secrets = PassSecrets::new(&self.collaborators.secrets);
        let resolution = resolver::resolve(&input, &mut secrets)?;
        for notice in &resolution.notices {
            self.reporter.notice(notice);
        }
        notices.extend(resolution.notices);
        let config = resolution.config;

        self.transition(PassState::Building);
        let services = plan::build_plan(&PlanInput {
            profile: self.profile,
            app_name: &self.settings.app_name,
            config: &config,
            integrations: &integrations,
            request: &snapshot.services,
            options: &snapshot.options,
        })?;
        let builtin = scrape::builtin_job(self.profile, &config)?;
        let scrape_targets = scrape::resolve_targets(builtin.as_ref(), &document, &snapshot.units)?;
        Ok(DesiredState {
            plan: WorkloadPlan { config, services },
            scrape_targets,
        })
    }

    fn apply(&mut self, desired: DesiredState) -> PassOutcome {
        self.transition(PassState::Applying);
        let supervisor = match self.collaborators.supervisor.submit(&desired.plan) {
            Ok(outcome) => outcome,
            Err(failure) => {
                let error = ReconcileError::from(failure);
                self.reporter.failed(self.state, &error);
                return PassOutcome::Failed(error);
            }
        };

        match self.collaborators.metrics.submit(&desired.scrape_targets) {
            Ok(metrics) => {
                let applied = Applied {
                    supervisor,
                    metrics,
                };
                self.reporter.applied(&desired, applied);
                self.last_applied = Some(desired);
                PassOutcome::Applied(applied)
            }
            Err(failure) => {
                let error = ReconcileError::from(failure);
                let scrape_targets = self
                    .last_applied
                    .take()
                    .map(|previous| previous.scrape_targets)
                    .unwrap_or_default();
                let recorded = DesiredState {
                    plan: desired.plan,
                    scrape_targets,
                };
                self.reporter.partially_applied(&recorded, supervisor, &error);
                self.last_applied = Some(recorded);
                PassOutcome::PartiallyApplied { supervisor, error }
            }
        }
    }
}
