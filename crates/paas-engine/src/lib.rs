//! Integration and runtime configuration reconciliation engine.
//!
//! Each pass reads a snapshot of the world (user options, integration data,
//! the customization document, unit topology), resolves one deterministic
//! runtime environment, plans the workload's services, expands metrics
//! scrape targets, and submits the result to the process supervisor and the
//! metrics collector. A pass either applies everything or nothing.
//!
//! The pipeline stages are exposed individually:
//!
//! - [`integration::read_integration`] normalises raw integration data.
//! - [`customization::load`] validates the customization document.
//! - [`resolver::resolve`] merges every configuration layer.
//! - [`plan::build_plan`] decides which services run.
//! - [`scrape::resolve_targets`] expands scrape targets.
//! - [`reconciler::Reconciler`] drives the stages as a state machine.

pub mod catalog;
pub mod customization;
pub mod error;
pub mod integration;
pub mod plan;
pub mod reconciler;
pub mod resolver;
pub mod scrape;
pub mod secret;
pub mod snapshot;
pub mod trigger;

pub use catalog::{Catalog, IntegrationDescriptor, IntegrationKind, WorkloadProfile};
pub use error::{ReconcileError, SecretResolutionError, ValidationError};
pub use integration::{Blocker, IntegrationInstance, IntegrationSet, Readiness};
pub use plan::{ServiceDefinition, ServicePlan, ServiceRole, WorkloadPlan};
pub use reconciler::{
    ApplyOutcome, Collaborators, DesiredState, EngineSettings, MetricsSink, Orchestrator,
    PassReport, PassState, ProcessSupervisor, ReconcileReporter, Reconciler,
    StructuredReconcileReporter,
};
pub use resolver::{Notice, RuntimeConfig};
pub use scrape::{ScrapeTarget, UnitTopology};
pub use secret::{SecretId, SecretStore};
pub use snapshot::WorldSnapshot;
pub use trigger::{Driver, TriggerQueue};

#[cfg(test)]
mod tests;
