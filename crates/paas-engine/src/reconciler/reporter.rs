//! Structured reporting for reconciliation passes.

use std::sync::Arc;

use crate::error::ReconcileError;
use crate::resolver::Notice;

use super::{Applied, ApplyOutcome, DesiredState, PassState};

/// Observer for pass progress.
pub trait ReconcileReporter: Send + Sync {
    /// Invoked on every state change.
    fn transition(&self, from: PassState, to: PassState);

    /// Invoked for each informational condition.
    fn notice(&self, notice: &Notice);

    /// Invoked when the pass fails in `state`.
    fn failed(&self, state: PassState, error: &ReconcileError);

    /// Invoked after the collaborators accepted the desired state.
    fn applied(&self, desired: &DesiredState, applied: Applied);

    /// Invoked when the supervisor accepted the plan and the metrics
    /// collector then failed. `recorded` is the state now in force.
    fn partially_applied(
        &self,
        recorded: &DesiredState,
        supervisor: ApplyOutcome,
        error: &ReconcileError,
    );
}

impl<T> ReconcileReporter for Arc<T>
where
    T: ReconcileReporter,
{
    fn transition(&self, from: PassState, to: PassState) {
        (**self).transition(from, to);
    }

    fn notice(&self, notice: &Notice) {
        (**self).notice(notice);
    }

    fn failed(&self, state: PassState, error: &ReconcileError) {
        (**self).failed(state, error);
    }

    fn applied(&self, desired: &DesiredState, applied: Applied) {
        (**self).applied(desired, applied);
    }

    fn partially_applied(
        &self,
        recorded: &DesiredState,
        supervisor: ApplyOutcome,
        error: &ReconcileError,
    ) {
        (**self).partially_applied(recorded, supervisor, error);
    }
}

/// Reporter that records pass events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredReconcileReporter;

impl StructuredReconcileReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ReconcileReporter for StructuredReconcileReporter {
    fn transition(&self, from: PassState, to: PassState) {
        tracing::debug!(
            target: "paas_engine::reconcile",
            event = "transition",
            from = %from,
            to = %to,
            "pass state changed"
        );
    }

    fn notice(&self, notice: &Notice) {
        tracing::info!(
            target: "paas_engine::reconcile",
            event = "notice",
            notice = %notice,
            "resolution notice"
        );
    }

    fn failed(&self, state: PassState, error: &ReconcileError) {
        if let ReconcileError::BlockedByIntegration { integration, .. } = error {
            tracing::warn!(
                target: "paas_engine::reconcile",
                event = "blocked",
                state = %state,
                integration = %integration,
                error = %error,
                "pass waiting for a required integration"
            );
        } else if let ReconcileError::BlockedByIntegrationGroup { candidates } = error {
            tracing::warn!(
                target: "paas_engine::reconcile",
                event = "blocked",
                state = %state,
                candidates = ?candidates,
                error = %error,
                "pass waiting for one of several integrations"
            );
        } else {
            tracing::error!(
                target: "paas_engine::reconcile",
                event = "failed",
                state = %state,
                category = error.category(),
                error = %error,
                "pass failed; keeping the previously applied state"
            );
        }
    }

    fn applied(&self, desired: &DesiredState, applied: Applied) {
        tracing::info!(
            target: "paas_engine::reconcile",
            event = "applied",
            services = desired.plan.services.len(),
            variables = desired.plan.config.len(),
            scrape_jobs = desired.scrape_targets.len(),
            supervisor = %applied.supervisor,
            metrics = %applied.metrics,
            "desired state submitted"
        );
    }

    fn partially_applied(
        &self,
        recorded: &DesiredState,
        supervisor: ApplyOutcome,
        error: &ReconcileError,
    ) {
        tracing::error!(
            target: "paas_engine::reconcile",
            event = "partially_applied",
            services = recorded.plan.services.len(),
            scrape_jobs = recorded.scrape_targets.len(),
            supervisor = %supervisor,
            error = %error,
            "plan submitted but scrape targets were rejected"
        );
    }
}
