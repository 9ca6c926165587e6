//! Driver for the reconciliation engine.
//!
//! `paasd` loads its settings through [`paas_config`], installs structured
//! telemetry, and wires the engine to file-backed collaborators: the world
//! snapshot and secrets are read from disk, and the desired state is written
//! to the output directory. Passes run once at startup and again on every
//! `SIGHUP`; termination signals stop the loop after the in-flight pass.

mod bootstrap;
pub mod collaborators;
mod health;
mod process;
mod telemetry;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, FileReconciler, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, run_daemon, run_daemon_with};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
