//! Merges defaults, integration data, user options, and secrets into one
//! runtime environment.
//!
//! Options are first checked against their declarations. Layers then apply
//! lowest first:
//!
//! 1. workload defaults and deployment context,
//! 2. ready integrations,
//! 3. plain user options,
//! 4. resolved secrets.
//!
//! A framework host list, when the workload has one, is computed last from
//! its option and the final base URL. The result is recomputed from scratch
//! on every pass. [`RuntimeConfig`] is a sorted map, so equal inputs always
//! serialise identically.

mod env;
pub(crate) mod naming;
mod schema;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::catalog::WorkloadProfile;
use crate::error::{ReconcileError, SecretResolutionError};
use crate::integration::{Blocker, IntegrationSet};
use crate::scrape::UnitTopology;
use crate::secret::{PassSecrets, SecretContent, SecretReference, SecretStore};
use crate::snapshot::{OptionSpec, OptionValue, WorkloadContext};

/// The resolved environment handed to every service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeConfig(BTreeMap<String, String>);

impl RuntimeConfig {
    /// Creates an empty environment.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns the value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Whether `name` is set.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Sets `name`, returning the value it replaces.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    /// Iterates variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no variable is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RuntimeConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// Informational conditions raised while resolving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// A secret reference shadows a plain option for the same setting.
    SecretOverridesPlain {
        /// Variable both options resolve to.
        setting: String,
        /// Plain option that was ignored.
        plain_option: String,
        /// Secret option that won.
        secret_option: String,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SecretOverridesPlain {
                setting,
                plain_option,
                secret_option,
            } => write!(
                f,
                "secret option '{secret_option}' overrides plain option '{plain_option}' for {setting}"
            ),
        }
    }
}

/// The resolved environment and any informational conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Resolved environment.
    pub config: RuntimeConfig,
    /// Informational conditions, in resolution order.
    pub notices: Vec<Notice>,
}

/// Inputs read during one pass.
#[derive(Debug, Clone, Copy)]
pub struct ResolverInput<'a> {
    /// Workload profile.
    pub profile: &'a WorkloadProfile,
    /// Application name.
    pub app_name: &'a str,
    /// Deployment facts.
    pub context: &'a WorkloadContext,
    /// The workload's own units.
    pub topology: &'a UnitTopology,
    /// Option declarations.
    pub schema: &'a BTreeMap<String, OptionSpec>,
    /// User configuration options.
    pub options: &'a BTreeMap<String, OptionValue>,
    /// Observed integrations.
    pub integrations: &'a IntegrationSet,
}

const SINGLE_VALUE_SUFFIX: &str = "-id";
const SINGLE_VALUE_KEY: &str = "value";

fn blocked(integrations: &IntegrationSet) -> Option<ReconcileError> {
    integrations
        .blocking()
        .first()
        .map(|blocker| match *blocker {
            Blocker::Required(instance) => ReconcileError::BlockedByIntegration {
                integration: instance.kind(),
                readiness: instance.readiness(),
                reason: instance.reason().map(str::to_owned),
            },
            Blocker::NoneReady(candidates) => ReconcileError::BlockedByIntegrationGroup {
                candidates: candidates.to_vec(),
            },
        })
}

fn web_port(input: &ResolverInput<'_>) -> String {
    input
        .profile
        .port_option
        .and_then(|option| input.options.get(option))
        .and_then(OptionValue::plain_value)
        .unwrap_or_else(|| input.profile.port.to_string())
}

fn apply_context(input: &ResolverInput<'_>, config: &mut RuntimeConfig) {
    let profile = input.profile;
    for (name, value) in profile.defaults {
        config.insert(*name, *value);
    }
    for option in profile.framework_options {
        if let Some(default) = option.default {
            config.insert(option.env, default);
        }
    }

    let base_url = input
        .context
        .base_url
        .clone()
        .unwrap_or_else(|| format!("http://{}:{}", input.app_name, web_port(input)));
    config.insert(format!("{}BASE_URL", profile.config_prefix), base_url);

    if let Some(key) = input.context.secret_key.as_deref().filter(|key| !key.is_empty()) {
        config.insert(format!("{}SECRET_KEY", profile.config_prefix), key);
    }

    let peers: Vec<&str> = input
        .topology
        .units()
        .iter()
        .map(|unit| unit.address.as_str())
        .collect();
    if !peers.is_empty() {
        config.insert(format!("{}PEER_FQDNS", profile.config_prefix), peers.join(","));
    }

    let proxy = &input.context.proxy;
    for (upper, lower, value) in [
        ("HTTP_PROXY", "http_proxy", &proxy.http_proxy),
        ("HTTPS_PROXY", "https_proxy", &proxy.https_proxy),
        ("NO_PROXY", "no_proxy", &proxy.no_proxy),
    ] {
        if let Some(setting) = value.as_deref().filter(|setting| !setting.is_empty()) {
            config.insert(upper, setting);
            config.insert(lower, setting);
        }
    }
}

fn is_host_list(profile: &WorkloadProfile, option: &str) -> bool {
    profile
        .allowed_hosts
        .is_some_and(|hosts| hosts.option == option)
}

fn host_list(input: &ResolverInput<'_>, config: &RuntimeConfig) -> Option<(&'static str, String)> {
    let hosts_option = input.profile.allowed_hosts?;
    let mut hosts: Vec<String> = input
        .options
        .get(hosts_option.option)
        .and_then(OptionValue::plain_value)
        .map(|text| {
            text.split(',')
                .map(str::trim)
                .filter(|host| !host.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();
    let base_host = config
        .get(&format!("{}BASE_URL", input.profile.config_prefix))
        .and_then(|base_url| Url::parse(base_url).ok())
        .and_then(|base_url| base_url.host_str().map(str::to_owned));
    hosts.extend(base_host);
    Some((hosts_option.env, serde_json::Value::from(hosts).to_string()))
}

fn secret_assignments(
    profile: &WorkloadProfile,
    option: &str,
    reference: &SecretReference,
    content: SecretContent,
) -> Result<Vec<(String, String)>, SecretResolutionError> {
    let malformed = |message: String| {
        let id = match reference {
            SecretReference::Literal(_) => String::from("<literal>"),
            SecretReference::Stored(id) => id.to_string(),
        };
        SecretResolutionError::Malformed {
            id,
            option: option.to_owned(),
            message,
        }
    };

    if let Some(setting) = option.strip_suffix(SINGLE_VALUE_SUFFIX) {
        let keys: Vec<&str> = content.keys().map(String::as_str).collect();
        if keys != [SINGLE_VALUE_KEY] {
            return Err(malformed(format!(
                "expected exactly one key '{SINGLE_VALUE_KEY}', found [{}]",
                keys.join(", ")
            )));
        }
        let value = content.into_values().next().unwrap_or_default();
        return Ok(vec![(naming::option_env(profile, setting), value)]);
    }

    if content.is_empty() {
        return Err(malformed(String::from("secret has no keys")));
    }
    let base = naming::option_env(profile, option);
    Ok(content
        .into_iter()
        .map(|(key, value)| (format!("{base}_{}", naming::upper_snake(&key)), value))
        .collect())
}

/// Resolves the runtime environment for one pass.
///
/// Every stored secret is fetched at most once through `secrets`.
///
/// # Errors
///
/// Returns [`ReconcileError::Validation`] when an option has the wrong type
/// or a non-optional option is unset,
/// [`ReconcileError::BlockedByIntegration`] naming the first required
/// integration, in catalog order, that is not ready,
/// [`ReconcileError::BlockedByIntegrationGroup`] when no member of the
/// workload's required group is ready, and
/// [`ReconcileError::SecretResolution`] when a secret cannot be fetched or
/// has the wrong shape. No partial result is returned.
pub fn resolve<S: SecretStore + ?Sized>(
    input: &ResolverInput<'_>,
    secrets: &mut PassSecrets<'_, S>,
) -> Result<Resolution, ReconcileError> {
    schema::check(input.schema, input.options)?;
    if let Some(error) = blocked(input.integrations) {
        return Err(error);
    }

    let profile = input.profile;
    let mut config = RuntimeConfig::new();
    apply_context(input, &mut config);

    for instance in input.integrations.ready() {
        for (name, value) in env::integration_env(instance, profile.config_prefix, input.app_name)
        {
            config.insert(name, value);
        }
    }

    let mut plain_sources: BTreeMap<String, &str> = BTreeMap::new();
    for (option, value) in input.options {
        if naming::is_webserver_option(option) || is_host_list(profile, option) {
            continue;
        }
        if let Some(text) = value.plain_value() {
            let name = naming::option_env(profile, option);
            config.insert(name.clone(), text);
            plain_sources.insert(name, option.as_str());
        }
    }

    let mut notices = Vec::new();
    for (option, value) in input.options {
        let OptionValue::Secret(reference) = value else {
            continue;
        };
        if naming::is_webserver_option(option) || is_host_list(profile, option) {
            continue;
        }
        let content = secrets.resolve(option, reference)?;
        for (name, secret) in secret_assignments(profile, option, reference, content)? {
            if let Some(plain_option) = plain_sources.get(&name) {
                notices.push(Notice::SecretOverridesPlain {
                    setting: name.clone(),
                    plain_option: (*plain_option).to_owned(),
                    secret_option: option.clone(),
                });
            }
            config.insert(name, secret);
        }
    }

    if let Some((name, hosts)) = host_list(input, &config) {
        config.insert(name, hosts);
    }

    Ok(Resolution { config, notices })
}
