//! Decides which services run and how each is launched.
//!
//! The web service is always planned. A worker joins it when the workload
//! kind supports background tasks, a task broker is ready, and a worker
//! command is declared or defaulted. A scheduler joins the worker under the
//! same conditions and is marked as a singleton; electing the unit that runs
//! it is left to the process supervisor.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::WorkloadProfile;
use crate::error::{ReconcileError, ValidationError};
use crate::integration::IntegrationSet;
use crate::resolver::RuntimeConfig;
use crate::snapshot::OptionValue;

/// Option selecting the gunicorn worker class.
pub const WORKER_CLASS_OPTION: &str = "webserver-worker-class";

const ALLOWED_WORKER_CLASSES: [&str; 2] = ["sync", "gevent"];

/// Role a service plays within the workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceRole {
    /// Serves HTTP traffic.
    Web,
    /// Consumes background tasks.
    Worker,
    /// Enqueues periodic tasks; at most one replica runs it.
    Scheduler,
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Web => "web",
            Self::Worker => "worker",
            Self::Scheduler => "scheduler",
        })
    }
}

/// How the supervisor launches one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    /// Unique service name.
    pub name: String,
    /// Service role.
    pub role: ServiceRole,
    /// Command line.
    pub command: String,
    /// User the process runs as.
    pub run_as_user: String,
    /// Working directory.
    pub working_directory: String,
    /// Process environment.
    pub environment: RuntimeConfig,
    /// Whether the supervisor starts the service with the workload.
    pub enabled_at_startup: bool,
    /// Whether only one replica across the deployment may run the service.
    pub singleton: bool,
}

/// The planned services keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServicePlan(BTreeMap<String, ServiceDefinition>);

impl ServicePlan {
    /// Looks up a service by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ServiceDefinition> {
        self.0.get(name)
    }

    /// Finds the service playing `role`.
    #[must_use]
    pub fn by_role(&self, role: ServiceRole) -> Option<&ServiceDefinition> {
        self.0.values().find(|service| service.role == role)
    }

    /// Iterates services in name order.
    pub fn iter(&self) -> impl Iterator<Item = &ServiceDefinition> {
        self.0.values()
    }

    /// Number of planned services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no service is planned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, service: ServiceDefinition) {
        self.0.insert(service.name.clone(), service);
    }
}

/// Auxiliary services declared by the workload image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceRequest {
    /// Background worker command.
    pub worker: Option<String>,
    /// Periodic scheduler command.
    pub scheduler: Option<String>,
}

impl ServiceRequest {
    /// Whether the image declares no auxiliary service.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.worker.is_none() && self.scheduler.is_none()
    }
}

/// Everything submitted to the process supervisor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadPlan {
    /// Resolved environment.
    pub config: RuntimeConfig,
    /// Planned services.
    pub services: ServicePlan,
}

/// Inputs to [`build_plan`].
#[derive(Debug, Clone, Copy)]
pub struct PlanInput<'a> {
    /// Workload profile.
    pub profile: &'a WorkloadProfile,
    /// Application name, used as the web service name.
    pub app_name: &'a str,
    /// Resolved environment.
    pub config: &'a RuntimeConfig,
    /// Observed integrations.
    pub integrations: &'a IntegrationSet,
    /// Auxiliary services declared by the image.
    pub request: &'a ServiceRequest,
    /// User configuration options.
    pub options: &'a BTreeMap<String, OptionValue>,
}

fn worker_class(input: &PlanInput<'_>) -> Result<Option<String>, ValidationError> {
    let configured = input
        .options
        .get(WORKER_CLASS_OPTION)
        .and_then(OptionValue::plain_value);
    if !input.profile.kind.is_gunicorn() {
        return match configured {
            Some(_) => Err(ValidationError::new(
                WORKER_CLASS_OPTION,
                format!("not supported by {} workloads", input.profile.kind),
            )),
            None => Ok(None),
        };
    }
    let class = configured.unwrap_or_else(|| String::from("sync"));
    if ALLOWED_WORKER_CLASSES.contains(&class.as_str()) {
        Ok(Some(class))
    } else {
        Err(ValidationError::new(
            WORKER_CLASS_OPTION,
            "Only 'gevent' and 'sync' are allowed.",
        ))
    }
}

fn service(
    input: &PlanInput<'_>,
    name: String,
    role: ServiceRole,
    command: String,
) -> ServiceDefinition {
    ServiceDefinition {
        name,
        role,
        command,
        run_as_user: input.profile.run_as_user.to_owned(),
        working_directory: input.profile.working_directory.to_owned(),
        environment: input.config.clone(),
        enabled_at_startup: true,
        singleton: matches!(role, ServiceRole::Scheduler),
    }
}

/// Declared or defaulted auxiliary commands, checked against the profile.
fn auxiliary_commands(
    input: &PlanInput<'_>,
) -> Result<(Option<String>, Option<String>), ReconcileError> {
    let tasks = &input.profile.tasks;
    let request = input.request;
    let kind = input.profile.kind;

    if request.scheduler.is_some() && request.worker.is_none() {
        return Err(ReconcileError::plan_conflict(
            "a scheduler is declared without a worker",
        ));
    }
    if request.worker.is_some() && !tasks.workers {
        return Err(ReconcileError::plan_conflict(format!(
            "{kind} workloads do not support background workers"
        )));
    }
    if request.scheduler.is_some() && !tasks.scheduler {
        return Err(ReconcileError::plan_conflict(format!(
            "{kind} workloads do not support a scheduler"
        )));
    }

    if request.is_empty() {
        return Ok((
            tasks.default_worker.map(str::to_owned),
            tasks.default_scheduler.map(str::to_owned),
        ));
    }
    Ok((request.worker.clone(), request.scheduler.clone()))
}

/// Builds the service plan for one pass.
///
/// Equal inputs produce equal plans.
///
/// # Errors
///
/// Returns [`ReconcileError::Validation`] when the worker class option is
/// invalid and [`ReconcileError::PlanConflict`] when the declared services
/// contradict each other or the workload kind.
pub fn build_plan(input: &PlanInput<'_>) -> Result<ServicePlan, ReconcileError> {
    let class = worker_class(input)?;
    let (worker, scheduler) = auxiliary_commands(input)?;

    let web_command = match class {
        Some(name) => format!("{} -k {name}", input.profile.web_command),
        None => input.profile.web_command.to_owned(),
    };

    let mut plan = ServicePlan::default();
    plan.push(service(
        input,
        input.app_name.to_owned(),
        ServiceRole::Web,
        web_command,
    ));

    let tasks = &input.profile.tasks;
    let worker_included =
        tasks.workers && input.integrations.has_ready_task_broker() && worker.is_some();
    if let Some(command) = worker.filter(|_| worker_included) {
        plan.push(service(
            input,
            format!("{}-worker", input.app_name),
            ServiceRole::Worker,
            command,
        ));
        if let Some(beat) = scheduler.filter(|_| tasks.scheduler) {
            plan.push(service(
                input,
                format!("{}-scheduler", input.app_name),
                ServiceRole::Scheduler,
                beat,
            ));
        }
    }
    Ok(plan)
}

#[cfg(test)]
mod tests;
