//! The read-only world view the orchestrator exposes to each pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::integration::RawIntegrationData;
use crate::plan::ServiceRequest;
use crate::scrape::UnitTopology;
use crate::secret::SecretReference;

/// A typed user configuration option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean option.
    Bool(bool),
    /// Integer option.
    Int(i64),
    /// String option.
    String(String),
    /// Secret-typed option.
    Secret(SecretReference),
}

impl OptionValue {
    /// Type the value was supplied as.
    #[must_use]
    pub const fn kind(&self) -> OptionType {
        match self {
            Self::Bool(_) => OptionType::Boolean,
            Self::Int(_) => OptionType::Int,
            Self::String(_) => OptionType::String,
            Self::Secret(_) => OptionType::Secret,
        }
    }

    /// Renders a plain option as an environment value.
    ///
    /// Returns `None` for secret-typed options.
    #[must_use]
    pub fn plain_value(&self) -> Option<String> {
        match self {
            Self::Bool(value) => Some(value.to_string()),
            Self::Int(value) => Some(value.to_string()),
            Self::String(value) => Some(value.clone()),
            Self::Secret(_) => None,
        }
    }
}

/// Declared type of a configuration option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OptionType {
    /// `true` or `false`.
    Boolean,
    /// Signed integer.
    Int,
    /// Free text.
    String,
    /// Reference to a secret.
    Secret,
}

const fn optional_by_default() -> bool {
    true
}

/// Declaration of one configuration option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionSpec {
    /// Declared type.
    #[serde(rename = "type")]
    pub kind: OptionType,
    /// Whether the workload may start while the option is unset.
    #[serde(default = "optional_by_default")]
    pub optional: bool,
}

/// Outbound proxy settings published by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProxySettings {
    /// HTTP proxy URL.
    pub http_proxy: Option<String>,
    /// HTTPS proxy URL.
    pub https_proxy: Option<String>,
    /// Hosts bypassing the proxy.
    pub no_proxy: Option<String>,
}

/// Facts about the workload's own deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkloadContext {
    /// Externally reachable base URL, when the orchestrator knows one.
    pub base_url: Option<String>,
    /// Application secret key managed on the workload's behalf. Exported as
    /// `<prefix>SECRET_KEY` unless an option sets that variable.
    pub secret_key: Option<String>,
    /// Outbound proxy settings.
    pub proxy: ProxySettings,
}

/// Everything a pass reads from the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldSnapshot {
    /// User configuration options by name.
    pub options: BTreeMap<String, OptionValue>,
    /// Declared options by name. Options without a declaration are accepted
    /// as given.
    pub option_schema: BTreeMap<String, OptionSpec>,
    /// Raw data per attached integration name.
    pub integrations: BTreeMap<String, RawIntegrationData>,
    /// Customization document text, if the workload ships one.
    pub customization: Option<String>,
    /// The workload's own replica set.
    pub units: UnitTopology,
    /// Deployment facts.
    pub context: WorkloadContext,
    /// Auxiliary services declared by the workload image.
    pub services: ServiceRequest,
}

#[cfg(test)]
mod tests;
