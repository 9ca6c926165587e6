//! Layered settings shared by the reconciliation engine and its driver.
//!
//! Values are resolved with `ortho_config` using the usual precedence:
//! built-in defaults, then a TOML file named by `--config-path` or
//! `PAAS_CONFIG_PATH`, then `PAAS_*` environment variables, and finally
//! command-line flags.

mod defaults;
mod logging;
mod workload;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    CUSTOMIZATION_FILE_NAME, DEFAULT_APP_NAME, DEFAULT_LOG_FILTER, default_app_name,
    default_customization_path, default_log_filter, default_log_filter_string, default_log_format,
    default_output_dir, default_secrets_dir, default_snapshot_path, default_workload_kind,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use workload::{WorkloadKind, WorkloadKindParseError};

/// Resolved driver and engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "PAAS")]
pub struct Config {
    /// Framework runtime of the managed workload.
    #[ortho_config(default = default_workload_kind())]
    #[serde(default = "default_workload_kind")]
    pub workload_kind: WorkloadKind,
    /// Application name used for service names and derived variables.
    #[ortho_config(default = default_app_name())]
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// JSON world snapshot exposed by the orchestrator.
    #[ortho_config(default = default_snapshot_path())]
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: Utf8PathBuf,
    /// Directory holding one JSON document per secret identifier.
    #[ortho_config(default = default_secrets_dir())]
    #[serde(default = "default_secrets_dir")]
    pub secrets_dir: Utf8PathBuf,
    /// Directory receiving the desired-state documents.
    #[ortho_config(default = default_output_dir())]
    #[serde(default = "default_output_dir")]
    pub output_dir: Utf8PathBuf,
    /// Location of the optional customization document.
    #[ortho_config(default = default_customization_path())]
    #[serde(default = "default_customization_path")]
    pub customization_path: Utf8PathBuf,
    /// Comma-separated integration names promoted to required.
    #[serde(default)]
    pub required_integrations: Option<String>,
    /// Tracing filter expression.
    #[ortho_config(default = default_log_filter_string())]
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Output format for structured logs.
    #[ortho_config(default = default_log_format())]
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workload_kind: default_workload_kind(),
            app_name: default_app_name(),
            snapshot_path: default_snapshot_path(),
            secrets_dir: default_secrets_dir(),
            output_dir: default_output_dir(),
            customization_path: default_customization_path(),
            required_integrations: None,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Framework runtime of the managed workload.
    #[must_use]
    pub const fn workload_kind(&self) -> WorkloadKind {
        self.workload_kind
    }

    /// Application name.
    #[must_use]
    pub fn app_name(&self) -> &str {
        self.app_name.as_str()
    }

    /// Path to the orchestrator world snapshot.
    #[must_use]
    pub fn snapshot_path(&self) -> &Utf8Path {
        self.snapshot_path.as_path()
    }

    /// Directory holding secret documents.
    #[must_use]
    pub fn secrets_dir(&self) -> &Utf8Path {
        self.secrets_dir.as_path()
    }

    /// Directory receiving desired-state documents.
    #[must_use]
    pub fn output_dir(&self) -> &Utf8Path {
        self.output_dir.as_path()
    }

    /// Path to the customization document.
    #[must_use]
    pub fn customization_path(&self) -> &Utf8Path {
        self.customization_path.as_path()
    }

    /// Integration names the operator promoted to required, trimmed,
    /// lowercased, deduplicated, and sorted.
    #[must_use]
    pub fn required_integrations(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .required_integrations
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Structured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
