//! Loads and validates the optional customization document.
//!
//! The document is YAML with a single recognised section:
//!
//! ```yaml
//! prometheus:
//!   scrape_configs:
//!     - job_name: worker-metrics
//!       metrics_path: /metrics
//!       static_configs:
//!         - targets: ["*:9100", "@scheduler:9200"]
//!           labels: {team: payments}
//! ```
//!
//! Text is parsed into a generic tree and then deserialised into typed
//! sections that reject unknown keys. Deserialisation tracks the field path,
//! so every rejection names the offending location. Job name presence and
//! uniqueness, and non-empty target groups, are checked afterwards.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::scrape::TargetExpression;

const DOCUMENT_PATH: &str = "<document>";
const SCRAPE_CONFIGS_PATH: &str = "prometheus.scrape_configs";

/// Metrics path used when a job declares none.
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

/// One `static_configs` entry before expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticConfig {
    /// Target expressions in document order.
    pub targets: Vec<TargetExpression>,
    /// Labels attached to every expanded target.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// One validated scrape job before expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Job name, unique within the document.
    pub job_name: String,
    /// HTTP path scraped on every target.
    pub metrics_path: String,
    /// Non-empty target groups.
    pub static_configs: Vec<StaticConfig>,
}

/// The validated customization document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customization {
    scrape_configs: Vec<ScrapeConfig>,
}

impl Customization {
    /// Creates a customization from already validated jobs.
    #[must_use]
    pub const fn new(scrape_configs: Vec<ScrapeConfig>) -> Self {
        Self { scrape_configs }
    }

    /// Custom scrape jobs in document order.
    #[must_use]
    pub fn scrape_configs(&self) -> &[ScrapeConfig] {
        &self.scrape_configs
    }

    /// Whether the document declares no jobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scrape_configs.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Document {
    #[serde(default)]
    prometheus: Option<PrometheusSection>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PrometheusSection {
    #[serde(default)]
    scrape_configs: Option<Vec<JobEntry>>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct JobEntry {
    #[serde(default)]
    job_name: Option<String>,
    #[serde(default)]
    metrics_path: Option<String>,
    #[serde(default)]
    static_configs: Option<Vec<StaticConfig>>,
}

impl JobEntry {
    fn into_scrape_config(self, index: usize) -> Result<ScrapeConfig, ValidationError> {
        let path = format!("{SCRAPE_CONFIGS_PATH}[{index}]");
        let job_name = match self.job_name {
            Some(name) if name.trim().is_empty() => {
                return Err(ValidationError::new(
                    format!("{path}.job_name"),
                    "must not be empty",
                ));
            }
            Some(name) => name,
            None => {
                return Err(ValidationError::new(
                    format!("{path}.job_name"),
                    "missing required field",
                ));
            }
        };
        let Some(static_configs) = self.static_configs else {
            return Err(ValidationError::new(
                format!("{path}.static_configs"),
                "missing required field",
            ));
        };
        if static_configs.is_empty() {
            return Err(ValidationError::new(
                format!("{path}.static_configs"),
                "at least one static config is required",
            ));
        }
        Ok(ScrapeConfig {
            job_name,
            metrics_path: self
                .metrics_path
                .unwrap_or_else(|| DEFAULT_METRICS_PATH.to_owned()),
            static_configs,
        })
    }
}

/// Parses and validates customization text.
///
/// `None`, empty, and whitespace-only text produce an empty customization.
///
/// # Errors
///
/// Returns [`ValidationError`] naming the offending field path when the text
/// is not YAML or breaks the schema.
pub fn load(text: Option<&str>) -> Result<Customization, ValidationError> {
    let Some(source) = text.filter(|source| !source.trim().is_empty()) else {
        return Ok(Customization::default());
    };
    let tree: serde_json::Value = serde_saphyr::from_str(source)
        .map_err(|error| ValidationError::new(DOCUMENT_PATH, error.to_string()))?;
    validate(&tree)
}

/// Validates an already parsed document tree.
///
/// A null tree is an empty document.
///
/// # Errors
///
/// Returns [`ValidationError`] naming the offending field path.
pub fn validate(tree: &serde_json::Value) -> Result<Customization, ValidationError> {
    if tree.is_null() {
        return Ok(Customization::default());
    }
    let document: Document = serde_path_to_error::deserialize(tree).map_err(|error| {
        let path = error.path().to_string();
        let location = if path == "." {
            DOCUMENT_PATH.to_owned()
        } else {
            path
        };
        ValidationError::new(location, error.inner().to_string())
    })?;
    let entries = document
        .prometheus
        .and_then(|section| section.scrape_configs)
        .unwrap_or_default();

    let mut seen = BTreeSet::new();
    let mut scrape_configs = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let config = entry.into_scrape_config(index)?;
        if !seen.insert(config.job_name.clone()) {
            return Err(ValidationError::new(
                format!("{SCRAPE_CONFIGS_PATH}[{index}].job_name"),
                format!("duplicate job name '{}'", config.job_name),
            ));
        }
        scrape_configs.push(config);
    }
    Ok(Customization::new(scrape_configs))
}
