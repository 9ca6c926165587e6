//! Crate-level test doubles, fixtures, and behaviour tests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::ApplyError;
use crate::integration::RawIntegrationData;
use crate::plan::WorkloadPlan;
use crate::reconciler::{ApplyOutcome, MetricsSink, ProcessSupervisor};
use crate::scrape::{ScrapeTarget, UnitInfo};
use crate::secret::{SecretContent, SecretId, SecretStore, SecretStoreError};
use crate::snapshot::OptionValue;

mod behaviour;

/// Builds raw integration data from literal pairs.
pub(crate) fn raw_data(fields: &[(&str, &str)], units: &[&str]) -> RawIntegrationData {
    RawIntegrationData {
        fields: fields
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect(),
        units: units.iter().map(|unit| (*unit).to_owned()).collect(),
    }
}

pub(crate) fn postgresql_data() -> RawIntegrationData {
    raw_data(
        &[
            ("database", "test-database"),
            ("endpoints", "test-postgresql:5432,test-postgresql-2:5432"),
            ("password", "test-password"),
            ("username", "test-username"),
        ],
        &[],
    )
}

pub(crate) fn mysql_data() -> RawIntegrationData {
    raw_data(
        &[
            ("database", "shop"),
            ("endpoints", "test-mysql:3306"),
            ("password", "test-password"),
            ("username", "shop"),
        ],
        &["10.1.0.1", "10.1.0.2"],
    )
}

pub(crate) fn redis_data() -> RawIntegrationData {
    raw_data(&[("url", "redis://10.1.88.132:6379")], &[])
}

pub(crate) fn oidc_data(client_id: &str) -> RawIntegrationData {
    raw_data(
        &[
            ("client_id", client_id),
            ("client_secret", "abc"),
            ("issuer_url", "https://idp.example.com"),
            ("authorization_endpoint", "https://idp.example.com/oauth2/auth"),
            ("token_endpoint", "https://idp.example.com/oauth2/token"),
            ("userinfo_endpoint", "https://idp.example.com/userinfo"),
            ("jwks_endpoint", "https://idp.example.com/.well-known/jwks.json"),
            ("scope", "openid profile email"),
        ],
        &[],
    )
}

pub(crate) fn text(value: &str) -> OptionValue {
    OptionValue::String(value.to_owned())
}

pub(crate) fn unit(name: &str, address: &str, ready: bool, scheduler: bool) -> UnitInfo {
    UnitInfo {
        name: name.to_owned(),
        address: address.to_owned(),
        ready,
        scheduler,
    }
}

/// Secret store backed by a fixed map that counts fetches.
#[derive(Default)]
pub(crate) struct StaticSecrets {
    secrets: BTreeMap<SecretId, SecretContent>,
    fetches: Mutex<Vec<SecretId>>,
}

impl StaticSecrets {
    pub(crate) fn with(mut self, id: &str, pairs: &[(&str, &str)]) -> Self {
        self.secrets.insert(
            SecretId::new(id),
            pairs
                .iter()
                .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
                .collect(),
        );
        self
    }

    pub(crate) fn fetches(&self) -> Vec<SecretId> {
        self.fetches
            .lock()
            .map(|fetches| fetches.clone())
            .unwrap_or_default()
    }
}

impl SecretStore for StaticSecrets {
    fn fetch(&self, id: &SecretId) -> Result<SecretContent, SecretStoreError> {
        if let Ok(mut fetches) = self.fetches.lock() {
            fetches.push(id.clone());
        }
        self.secrets
            .get(id)
            .cloned()
            .ok_or_else(|| SecretStoreError::new(format!("secret '{id}' not found")))
    }
}

/// Supervisor double that reports `Unchanged` for a repeated plan.
#[derive(Default)]
pub(crate) struct NoOpDetectingSupervisor {
    current: RefCell<Option<WorkloadPlan>>,
    changes: RefCell<usize>,
}

impl NoOpDetectingSupervisor {
    pub(crate) fn current(&self) -> Option<WorkloadPlan> {
        self.current.borrow().clone()
    }

    pub(crate) fn changes(&self) -> usize {
        *self.changes.borrow()
    }
}

impl ProcessSupervisor for NoOpDetectingSupervisor {
    fn submit(&self, plan: &WorkloadPlan) -> Result<ApplyOutcome, ApplyError> {
        let mut current = self.current.borrow_mut();
        if current.as_ref() == Some(plan) {
            return Ok(ApplyOutcome::Unchanged);
        }
        *current = Some(plan.clone());
        *self.changes.borrow_mut() += 1;
        Ok(ApplyOutcome::Changed)
    }
}

/// Metrics double that reports `Unchanged` for a repeated target set.
#[derive(Default)]
pub(crate) struct NoOpDetectingMetrics {
    current: RefCell<Option<Vec<ScrapeTarget>>>,
    changes: RefCell<usize>,
}

impl NoOpDetectingMetrics {
    pub(crate) fn current(&self) -> Option<Vec<ScrapeTarget>> {
        self.current.borrow().clone()
    }

    pub(crate) fn changes(&self) -> usize {
        *self.changes.borrow()
    }
}

impl MetricsSink for NoOpDetectingMetrics {
    fn submit(&self, targets: &[ScrapeTarget]) -> Result<ApplyOutcome, ApplyError> {
        let mut current = self.current.borrow_mut();
        if current.as_deref() == Some(targets) {
            return Ok(ApplyOutcome::Unchanged);
        }
        *current = Some(targets.to_vec());
        *self.changes.borrow_mut() += 1;
        Ok(ApplyOutcome::Changed)
    }
}
