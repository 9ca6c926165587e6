use camino::Utf8PathBuf;

use crate::logging::LogFormat;
use crate::workload::WorkloadKind;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Application name used when the orchestrator does not supply one.
pub const DEFAULT_APP_NAME: &str = "app";

/// File name of the optional customization document.
pub const CUSTOMIZATION_FILE_NAME: &str = "paas-config.yaml";

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default workload kind.
#[must_use]
pub const fn default_workload_kind() -> WorkloadKind {
    WorkloadKind::Flask
}

/// Owned default application name.
#[must_use]
pub fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_owned()
}

/// Default location of the orchestrator world snapshot.
#[must_use]
pub fn default_snapshot_path() -> Utf8PathBuf {
    Utf8PathBuf::from("state/snapshot.json")
}

/// Default directory holding one JSON document per secret.
#[must_use]
pub fn default_secrets_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("state/secrets")
}

/// Default directory receiving the desired-state documents.
#[must_use]
pub fn default_output_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("state/out")
}

/// Default location of the customization document.
#[must_use]
pub fn default_customization_path() -> Utf8PathBuf {
    Utf8PathBuf::from(CUSTOMIZATION_FILE_NAME)
}
