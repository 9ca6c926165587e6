//! Expands scrape target expressions into concrete addresses.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::WorkloadProfile;
use crate::customization::{Customization, ScrapeConfig, StaticConfig};
use crate::error::ValidationError;
use crate::resolver::RuntimeConfig;

/// Name of the job scraping the workload's own metrics endpoint.
pub const BUILTIN_JOB_NAME: &str = "app-metrics";

const WILDCARD_PREFIX: &str = "*:";
const SCHEDULER_PREFIX: &str = "@scheduler:";

/// A scrape target before expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TargetExpression {
    /// A `host:port` address used verbatim.
    Literal(String),
    /// `*:PORT`, one address per ready workload unit.
    Wildcard {
        /// Port appended to every unit address.
        port: u16,
    },
    /// `@scheduler:PORT`, the unit holding the scheduler role.
    Scheduler {
        /// Port appended to the scheduler unit address.
        port: u16,
    },
}

fn parse_port(text: &str, form: &str) -> Result<u16, String> {
    match text.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(format!("{form} target requires a numeric port, got '{text}'")),
    }
}

impl TargetExpression {
    /// Parses a target expression.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when a placeholder lacks a
    /// numeric port, an unknown placeholder is used, or the text is blank.
    pub fn parse(text: &str) -> Result<Self, String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(String::from("target must not be empty"));
        }
        if let Some(port) = trimmed.strip_prefix(WILDCARD_PREFIX) {
            return parse_port(port, "wildcard").map(|port_number| Self::Wildcard {
                port: port_number,
            });
        }
        if let Some(port) = trimmed.strip_prefix(SCHEDULER_PREFIX) {
            return parse_port(port, "scheduler").map(|port_number| Self::Scheduler {
                port: port_number,
            });
        }
        if trimmed == "@scheduler" {
            return Err(String::from("scheduler target requires a numeric port"));
        }
        if trimmed.starts_with('@') || trimmed.starts_with('*') {
            return Err(format!("unknown target placeholder '{trimmed}'"));
        }
        Ok(Self::Literal(trimmed.to_owned()))
    }
}

impl fmt::Display for TargetExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(address) => f.write_str(address),
            Self::Wildcard { port } => write!(f, "{WILDCARD_PREFIX}{port}"),
            Self::Scheduler { port } => write!(f, "{SCHEDULER_PREFIX}{port}"),
        }
    }
}

impl TryFrom<String> for TargetExpression {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TargetExpression> for String {
    fn from(value: TargetExpression) -> Self {
        value.to_string()
    }
}

/// One unit of the workload's own replica set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitInfo {
    /// Orchestrator unit name.
    pub name: String,
    /// Reachable address without a port.
    pub address: String,
    /// Whether the unit currently serves traffic.
    #[serde(default)]
    pub ready: bool,
    /// Whether the unit currently holds the scheduler role.
    #[serde(default)]
    pub scheduler: bool,
}

/// The workload's replica set as reported by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitTopology {
    units: Vec<UnitInfo>,
}

impl UnitTopology {
    /// Creates a topology preserving orchestrator order.
    #[must_use]
    pub const fn new(units: Vec<UnitInfo>) -> Self {
        Self { units }
    }

    /// Every unit in orchestrator order.
    #[must_use]
    pub fn units(&self) -> &[UnitInfo] {
        &self.units
    }

    /// Addresses of ready units in orchestrator order.
    pub fn ready_addresses(&self) -> impl Iterator<Item = &str> {
        self.units
            .iter()
            .filter(|unit| unit.ready)
            .map(|unit| unit.address.as_str())
    }

    /// Address of the unit holding the scheduler role.
    ///
    /// When more than one unit claims the role, the first in orchestrator
    /// order wins.
    #[must_use]
    pub fn scheduler_address(&self) -> Option<&str> {
        let mut holders = self.units.iter().filter(|unit| unit.scheduler);
        let first = holders.next()?;
        if holders.next().is_some() {
            warn!(
                target: "paas_engine::reconcile",
                unit = first.name.as_str(),
                "several units claim the scheduler role; using the first"
            );
        }
        Some(first.address.as_str())
    }
}

/// One expanded target group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticTarget {
    /// Concrete `host:port` addresses.
    #[serde(rename = "targets")]
    pub addresses: Vec<String>,
    /// Labels attached to every address.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// A fully resolved scrape job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeTarget {
    /// Job name, unique across the submitted set.
    pub job_name: String,
    /// HTTP path scraped on every target.
    pub metrics_path: String,
    /// Expanded target groups.
    #[serde(rename = "static_configs")]
    pub static_targets: Vec<StaticTarget>,
}

fn configured_port(config: &RuntimeConfig, env: &str) -> Result<Option<u16>, ValidationError> {
    config
        .get(env)
        .map(|value| {
            value
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|port| *port > 0)
                .ok_or_else(|| ValidationError::new(env, format!("'{value}' is not a valid port")))
        })
        .transpose()
}

/// Describes the built-in job for the workload's own metrics endpoint.
///
/// Returns `None` when the workload publishes no metrics port.
///
/// # Errors
///
/// Returns [`ValidationError`] when the configured metrics port is not a
/// valid port number.
pub fn builtin_job(
    profile: &WorkloadProfile,
    config: &RuntimeConfig,
) -> Result<Option<ScrapeConfig>, ValidationError> {
    let metrics = &profile.metrics;
    let configured = match metrics.port_env {
        Some(env) => configured_port(config, env)?,
        None => None,
    };
    let Some(port) = configured.or(metrics.default_port) else {
        return Ok(None);
    };
    let metrics_path = metrics
        .path_env
        .and_then(|env| config.get(env))
        .map_or_else(|| metrics.default_path.to_owned(), str::to_owned);
    Ok(Some(ScrapeConfig {
        job_name: BUILTIN_JOB_NAME.to_owned(),
        metrics_path,
        static_configs: vec![StaticConfig {
            targets: vec![TargetExpression::Wildcard { port }],
            labels: BTreeMap::new(),
        }],
    }))
}

fn expand_target(expression: &TargetExpression, topology: &UnitTopology) -> Vec<String> {
    match expression {
        TargetExpression::Literal(address) => vec![address.clone()],
        TargetExpression::Wildcard { port } => topology
            .ready_addresses()
            .map(|address| format!("{address}:{port}"))
            .collect(),
        TargetExpression::Scheduler { port } => topology
            .scheduler_address()
            .map(|address| format!("{address}:{port}"))
            .into_iter()
            .collect(),
    }
}

fn expand(config: &ScrapeConfig, topology: &UnitTopology) -> ScrapeTarget {
    let static_targets = config
        .static_configs
        .iter()
        .map(|group| StaticTarget {
            addresses: group
                .targets
                .iter()
                .flat_map(|expression| expand_target(expression, topology))
                .collect(),
            labels: group.labels.clone(),
        })
        .collect();
    ScrapeTarget {
        job_name: config.job_name.clone(),
        metrics_path: config.metrics_path.clone(),
        static_targets,
    }
}

/// Merges the built-in job with custom jobs and expands every target.
///
/// The built-in job comes first, followed by custom jobs in document order.
/// Placeholders that match no unit expand to an empty target list and the
/// job is kept.
///
/// # Errors
///
/// Returns [`ValidationError`] when a custom job reuses a job name already
/// taken by the built-in job or an earlier custom job.
pub fn resolve_targets(
    builtin: Option<&ScrapeConfig>,
    customization: &Customization,
    topology: &UnitTopology,
) -> Result<Vec<ScrapeTarget>, ValidationError> {
    let mut names = BTreeSet::new();
    let mut targets = Vec::new();
    if let Some(config) = builtin {
        names.insert(config.job_name.as_str());
        targets.push(expand(config, topology));
    }
    for (index, config) in customization.scrape_configs().iter().enumerate() {
        if !names.insert(config.job_name.as_str()) {
            return Err(ValidationError::new(
                format!("prometheus.scrape_configs[{index}].job_name"),
                format!("job name '{}' is already in use", config.job_name),
            ));
        }
        targets.push(expand(config, topology));
    }
    Ok(targets)
}
