//! Structured health reporting for driver lifecycle events.

use std::sync::Arc;

use paas_config::Config;
use paas_engine::trigger::DriverSummary;

use crate::bootstrap::BootstrapError;

/// Observer for driver lifecycle events.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked when a signal requests another pass.
    fn pass_requested(&self, signal: i32, queued: bool);

    /// Invoked when a signal stops the driver.
    fn shutdown_requested(&self, signal: i32);

    /// Invoked once the driver loop has drained.
    fn stopped(&self, summary: DriverSummary);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn pass_requested(&self, signal: i32, queued: bool) {
        (**self).pass_requested(signal, queued);
    }

    fn shutdown_requested(&self, signal: i32) {
        (**self).shutdown_requested(signal);
    }

    fn stopped(&self, summary: DriverSummary) {
        (**self).stopped(summary);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: "paasd::health",
            event = "bootstrap_starting",
            "starting driver bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: "paasd::health",
            event = "bootstrap_succeeded",
            workload_kind = %config.workload_kind(),
            app_name = config.app_name(),
            snapshot = %config.snapshot_path(),
            output_dir = %config.output_dir(),
            log_format = ?config.log_format(),
            "driver bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: "paasd::health",
            event = "bootstrap_failed",
            error = %error,
            "driver bootstrap failed"
        );
    }

    fn pass_requested(&self, signal: i32, queued: bool) {
        tracing::info!(
            target: "paasd::health",
            event = "pass_requested",
            signal,
            queued,
            "reconciliation pass requested"
        );
    }

    fn shutdown_requested(&self, signal: i32) {
        tracing::info!(
            target: "paasd::health",
            event = "shutdown_requested",
            signal,
            "stopping after the in-flight pass"
        );
    }

    fn stopped(&self, summary: DriverSummary) {
        tracing::info!(
            target: "paasd::health",
            event = "stopped",
            passes = summary.passes,
            failures = summary.failures,
            "driver stopped"
        );
    }
}
