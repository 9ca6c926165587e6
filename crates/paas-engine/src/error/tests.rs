//! Unit tests for reconciliation errors.

use rstest::rstest;

use super::*;

#[test]
fn blocked_message_includes_reason() {
    let error = ReconcileError::BlockedByIntegration {
        integration: IntegrationKind::Postgresql,
        readiness: Readiness::Pending,
        reason: Some(String::from("missing mandatory field 'password'")),
    };
    assert_eq!(
        error.to_string(),
        "required integration 'postgresql' is pending: missing mandatory field 'password'"
    );
}

#[test]
fn blocked_message_without_reason() {
    let error = ReconcileError::BlockedByIntegration {
        integration: IntegrationKind::Redis,
        readiness: Readiness::Absent,
        reason: None,
    };
    assert_eq!(error.to_string(), "required integration 'redis' is absent");
}

#[test]
fn group_blocked_message_lists_candidates() {
    let error = ReconcileError::BlockedByIntegrationGroup {
        candidates: vec![IntegrationKind::Postgresql, IntegrationKind::Mysql],
    };
    assert_eq!(
        error.to_string(),
        "workload needs one of the integrations [postgresql, mysql] to be ready"
    );
    assert_eq!(error.category(), "blocked_by_integration");
}

#[test]
fn validation_error_names_path() {
    let error = ValidationError::new("prometheus.scrape_configs[0].job_name", "must not be empty");
    assert_eq!(error.path(), "prometheus.scrape_configs[0].job_name");
    assert_eq!(
        error.to_string(),
        "invalid value at 'prometheus.scrape_configs[0].job_name': must not be empty"
    );
}

#[rstest]
#[case::blocked(
    ReconcileError::BlockedByIntegration {
        integration: IntegrationKind::Mysql,
        readiness: Readiness::Absent,
        reason: None,
    },
    "blocked_by_integration"
)]
#[case::validation(ValidationError::new("a", "b").into(), "validation")]
#[case::secret(
    SecretResolutionError::Unavailable {
        id: String::from("secret:1"),
        option: String::from("api-key-id"),
        message: String::from("not granted"),
    }
    .into(),
    "secret_resolution"
)]
#[case::conflict(ReconcileError::plan_conflict("scheduler without worker"), "plan_conflict")]
#[case::orchestrator(OrchestratorError::new("gone").into(), "orchestrator")]
#[case::apply(ApplyError::new("supervisor", "refused").into(), "apply")]
fn categories_are_stable(#[case] error: ReconcileError, #[case] expected: &str) {
    assert_eq!(error.category(), expected);
}
