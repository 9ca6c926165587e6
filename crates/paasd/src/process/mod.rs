//! Process entrypoint: bootstrap, signal handling, and the pass loop.

mod signals;

use std::io;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use paas_engine::trigger::{Driver, DriverSummary, TriggerQueue};

use crate::bootstrap::{BootstrapError, ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};

use self::signals::SignalListener;

const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Errors that stop the driver before its loop runs.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrapping the driver failed.
    #[error("driver bootstrap failed: {source}")]
    Bootstrap {
        /// Underlying bootstrap error.
        #[source]
        source: BootstrapError,
    },
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Signals {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl From<BootstrapError> for LaunchError {
    fn from(source: BootstrapError) -> Self {
        Self::Bootstrap { source }
    }
}

/// Runs the driver with the system configuration until a stop signal.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap or signal installation fails.
pub fn run_daemon() -> Result<DriverSummary, LaunchError> {
    run_daemon_with(&SystemConfigLoader, Arc::new(StructuredHealthReporter::new()))
}

/// Runs the driver with explicit collaborators.
///
/// An initial pass runs immediately. `SIGHUP` requests another pass;
/// `SIGTERM`, `SIGINT`, and `SIGQUIT` stop the loop once the in-flight pass
/// completes.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap or signal installation fails.
pub fn run_daemon_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<DriverSummary, LaunchError> {
    let daemon = bootstrap_with(loader, Arc::clone(&reporter))?;
    let queue = Arc::new(TriggerQueue::new());
    let listener = SignalListener::spawn(Arc::clone(&queue), Arc::clone(&reporter))
        .map_err(|source| LaunchError::Signals { source })?;

    let queued = queue.trigger();
    info!(
        target: PROCESS_TARGET,
        app_name = daemon.config().app_name(),
        queued,
        "running initial reconciliation pass"
    );

    let mut driver = Driver::new(queue, daemon.into_engine());
    let summary = driver.run();
    listener.stop();
    reporter.stopped(summary);
    Ok(summary)
}
