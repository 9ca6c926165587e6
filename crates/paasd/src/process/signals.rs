//! Maps process signals onto the trigger queue.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};

use paas_engine::TriggerQueue;

use crate::health::HealthReporter;

/// Signals the listener subscribes to.
pub(crate) const HANDLED_SIGNALS: [i32; 4] = [SIGHUP, SIGTERM, SIGINT, SIGQUIT];

/// What a signal asks the driver to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SignalAction {
    /// Run another pass.
    Reconcile,
    /// Stop after the in-flight pass.
    Shutdown,
}

pub(crate) const fn action_for(signal: i32) -> SignalAction {
    match signal {
        SIGHUP => SignalAction::Reconcile,
        _ => SignalAction::Shutdown,
    }
}

/// Applies `signal` to the queue. Returns `false` once listening should stop.
pub(crate) fn dispatch(signal: i32, queue: &TriggerQueue, reporter: &dyn HealthReporter) -> bool {
    match action_for(signal) {
        SignalAction::Reconcile => {
            let queued = queue.trigger();
            reporter.pass_requested(signal, queued);
            true
        }
        SignalAction::Shutdown => {
            reporter.shutdown_requested(signal);
            queue.close();
            false
        }
    }
}

/// Background thread feeding signals into the trigger queue.
pub(crate) struct SignalListener {
    handle: Handle,
    thread: JoinHandle<()>,
}

impl SignalListener {
    /// Installs the handlers and starts listening.
    pub(crate) fn spawn(
        queue: Arc<TriggerQueue>,
        reporter: Arc<dyn HealthReporter>,
    ) -> io::Result<Self> {
        let mut signals = Signals::new(HANDLED_SIGNALS)?;
        let handle = signals.handle();
        let thread = thread::Builder::new()
            .name(String::from("paasd-signals"))
            .spawn(move || {
                for signal in signals.forever() {
                    if !dispatch(signal, &queue, reporter.as_ref()) {
                        break;
                    }
                }
            })?;
        Ok(Self { handle, thread })
    }

    /// Unregisters the handlers and joins the listener thread.
    pub(crate) fn stop(self) {
        self.handle.close();
        if self.thread.join().is_err() {
            tracing::warn!(
                target: super::PROCESS_TARGET,
                "signal listener thread panicked"
            );
        }
    }
}
