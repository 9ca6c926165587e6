//! Serialises externally triggered passes.
//!
//! Triggers arriving while a pass runs coalesce into a single pending
//! trigger, so at most one further pass follows the one in flight.

use std::sync::{Arc, Condvar, Mutex, PoisonError};

use tracing::debug;

use crate::reconciler::{
    MetricsSink, Orchestrator, PassReport, ProcessSupervisor, ReconcileReporter, Reconciler,
};
use crate::secret::SecretStore;

#[derive(Debug, Default)]
struct TriggerState {
    pending: bool,
    closed: bool,
}

/// Coalescing single-slot trigger queue.
#[derive(Debug, Default)]
pub struct TriggerQueue {
    state: Mutex<TriggerState>,
    ready: Condvar,
}

impl TriggerQueue {
    /// Creates an open queue with no pending trigger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a pass.
    ///
    /// Returns `false` when a trigger was already pending or the queue is
    /// closed.
    #[must_use]
    pub fn trigger(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.closed || state.pending {
            return false;
        }
        state.pending = true;
        self.ready.notify_one();
        true
    }

    /// Stops the queue. A pending trigger is discarded.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.closed = true;
        state.pending = false;
        self.ready.notify_all();
    }

    /// Whether [`Self::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed
    }

    /// Blocks until a trigger is pending or the queue closes.
    ///
    /// Returns `true` after consuming a trigger and `false` once closed.
    #[must_use]
    pub fn wait(&self) -> bool {
        let guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut state = self
            .ready
            .wait_while(guard, |current| !current.pending && !current.closed)
            .unwrap_or_else(PoisonError::into_inner);
        if state.closed {
            return false;
        }
        state.pending = false;
        true
    }
}

/// Something that runs one complete pass.
pub trait PassRunner {
    /// Runs a pass to completion.
    fn run_pass(&mut self) -> PassReport;
}

impl<O, S, P, M, R> PassRunner for Reconciler<O, S, P, M, R>
where
    O: Orchestrator,
    S: SecretStore,
    P: ProcessSupervisor,
    M: MetricsSink,
    R: ReconcileReporter,
{
    fn run_pass(&mut self) -> PassReport {
        Self::run_pass(self)
    }
}

/// Totals accumulated by [`Driver::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverSummary {
    /// Passes run.
    pub passes: usize,
    /// Passes that ended in failure.
    pub failures: usize,
}

/// Pumps triggers into serial passes.
pub struct Driver<T> {
    queue: Arc<TriggerQueue>,
    runner: T,
}

impl<T: PassRunner> Driver<T> {
    /// Creates a driver reading from `queue`.
    #[must_use]
    pub const fn new(queue: Arc<TriggerQueue>, runner: T) -> Self {
        Self { queue, runner }
    }

    /// Runs one pass per trigger until the queue closes.
    pub fn run(&mut self) -> DriverSummary {
        let mut summary = DriverSummary::default();
        while self.queue.wait() {
            let report = self.runner.run_pass();
            summary.passes += 1;
            if !report.is_applied() {
                summary.failures += 1;
            }
            debug!(
                target: "paas_engine::reconcile",
                passes = summary.passes,
                failures = summary.failures,
                state = %report.state,
                "pass finished"
            );
        }
        summary
    }

    /// Borrows the runner.
    #[must_use]
    pub const fn runner(&self) -> &T {
        &self.runner
    }

    /// Returns the runner.
    #[must_use]
    pub fn into_runner(self) -> T {
        self.runner
    }
}
