//! File-backed implementations of the engine's collaborator traits.
//!
//! The orchestrator publishes a JSON world snapshot and one JSON document per
//! secret. Desired state is written back as `plan.json` and
//! `scrape_jobs.json` in the output directory; a file is rewritten only when
//! its serialised contents change.

mod orchestrator;
mod output;
mod secrets;

pub use self::orchestrator::FileOrchestrator;
pub use self::output::{FileMetricsSink, FileSupervisor, PLAN_FILE, SCRAPE_JOBS_FILE};
pub use self::secrets::DirectorySecretStore;

#[cfg(test)]
mod tests;
