//! Domain errors raised by a reconciliation pass.
//!
//! Every failure is local to the pass that produced it: the reconciler
//! surfaces the diagnostic, keeps the previously applied desired state, and
//! waits for the next trigger. Variants carry structured context so reporters
//! can name the offending integration, field, or job.

use thiserror::Error;

use crate::catalog::IntegrationKind;
use crate::integration::Readiness;

/// A field-path-qualified validation failure.
///
/// Paths use dotted keys with bracketed indices, for example
/// `prometheus.scrape_configs[1].static_configs[0].targets[2]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value at '{path}': {message}")]
pub struct ValidationError {
    path: String,
    message: String,
}

impl ValidationError {
    /// Creates a validation error for `path`.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the offending field path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Returns the human-readable reason.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Failures fetching or interpreting an externally held secret.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecretResolutionError {
    /// The secret store could not produce the secret.
    #[error("secret '{id}' referenced by option '{option}' could not be read: {message}")]
    Unavailable {
        /// Opaque secret identifier.
        id: String,
        /// Configuration option holding the reference.
        option: String,
        /// Reason reported by the store.
        message: String,
    },

    /// The secret was read but does not have the expected shape.
    #[error("secret '{id}' referenced by option '{option}' is malformed: {message}")]
    Malformed {
        /// Opaque secret identifier.
        id: String,
        /// Configuration option holding the reference.
        option: String,
        /// Description of the shape violation.
        message: String,
    },
}

/// The orchestrator could not expose the current world view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to read the orchestrator snapshot: {message}")]
pub struct OrchestratorError {
    message: String,
}

impl OrchestratorError {
    /// Creates an orchestrator failure.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A collaborator rejected or failed to record a submitted desired state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{collaborator} rejected the desired state: {message}")]
pub struct ApplyError {
    collaborator: &'static str,
    message: String,
}

impl ApplyError {
    /// Creates an apply failure attributed to `collaborator`.
    #[must_use]
    pub fn new(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self {
            collaborator,
            message: message.into(),
        }
    }

    /// Returns the collaborator that failed.
    #[must_use]
    pub const fn collaborator(&self) -> &'static str {
        self.collaborator
    }
}

/// Errors raised while building the integration catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The operator promoted an integration the catalog does not know.
    #[error("unknown integration '{name}'")]
    UnknownIntegration {
        /// Name that was looked up.
        name: String,
    },
}

fn kind_list(kinds: &[IntegrationKind]) -> String {
    kinds
        .iter()
        .copied()
        .map(IntegrationKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failures that abort a single reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// A required integration is absent or still provisioning.
    #[error(
        "required integration '{integration}' is {readiness}{}",
        .reason.as_deref().map(|reason| format!(": {reason}")).unwrap_or_default()
    )]
    BlockedByIntegration {
        /// Integration that blocks the pass.
        integration: IntegrationKind,
        /// Observed readiness.
        readiness: Readiness,
        /// Why the integration is not ready, when known.
        reason: Option<String>,
    },

    /// None of a group of integrations the workload needs one of is ready.
    #[error("workload needs one of the integrations [{}] to be ready", kind_list(.candidates))]
    BlockedByIntegrationGroup {
        /// Integrations any one of which would unblock the pass.
        candidates: Vec<IntegrationKind>,
    },

    /// The customization document, an option, or a scrape job is invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced secret is missing or malformed.
    #[error(transparent)]
    SecretResolution(#[from] SecretResolutionError),

    /// The requested services cannot form a valid plan.
    #[error("service plan conflict: {message}")]
    PlanConflict {
        /// Description of the conflict.
        message: String,
    },

    /// The orchestrator snapshot could not be read.
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    /// A collaborator failed to accept the desired state.
    #[error(transparent)]
    Apply(#[from] ApplyError),
}

impl ReconcileError {
    /// Creates a plan conflict.
    #[must_use]
    pub fn plan_conflict(message: impl Into<String>) -> Self {
        Self::PlanConflict {
            message: message.into(),
        }
    }

    /// Returns a stable machine-readable category for logs.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::BlockedByIntegration { .. } | Self::BlockedByIntegrationGroup { .. } => {
                "blocked_by_integration"
            }
            Self::Validation(_) => "validation",
            Self::SecretResolution(_) => "secret_resolution",
            Self::PlanConflict { .. } => "plan_conflict",
            Self::Orchestrator(_) => "orchestrator",
            Self::Apply(_) => "apply",
        }
    }
}

#[cfg(test)]
mod tests;
