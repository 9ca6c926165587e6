//! Writes the desired state for the supervisor and the metrics collector.

use std::fs;
use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tempfile::Builder;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use paas_engine::error::ApplyError;
use paas_engine::{ApplyOutcome, MetricsSink, ProcessSupervisor, ScrapeTarget, WorkloadPlan};

/// File receiving the workload plan.
pub const PLAN_FILE: &str = "plan.json";

/// File receiving the scrape jobs.
pub const SCRAPE_JOBS_FILE: &str = "scrape_jobs.json";

/// Replaces `path` with `contents` through a rename in the same directory.
fn atomic_write(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    let directory = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "output path has no parent directory")
    })?;

    let mut builder = Builder::new();
    builder.prefix(path.file_name().unwrap_or("paasd"));
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        builder.permissions(Permissions::from_mode(0o600));
    }

    let mut file = builder.tempfile_in(directory)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}

fn write_if_changed<T: Serialize + ?Sized>(
    collaborator: &'static str,
    path: &Utf8Path,
    value: &T,
) -> Result<ApplyOutcome, ApplyError> {
    let mut contents = serde_json::to_vec_pretty(value)
        .map_err(|error| ApplyError::new(collaborator, format!("cannot serialise: {error}")))?;
    contents.push(b'\n');

    match fs::read(path) {
        Ok(existing) if existing == contents => return Ok(ApplyOutcome::Unchanged),
        Ok(_) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => {
            return Err(ApplyError::new(
                collaborator,
                format!("cannot read '{path}': {error}"),
            ));
        }
    }
    atomic_write(path, &contents)
        .map_err(|error| ApplyError::new(collaborator, format!("cannot write '{path}': {error}")))?;
    tracing::debug!(
        target: "paasd::process",
        path = %path,
        bytes = contents.len(),
        "desired state written"
    );
    Ok(ApplyOutcome::Changed)
}

/// Supervisor writing the workload plan to `plan.json`.
#[derive(Debug, Clone)]
pub struct FileSupervisor {
    path: Utf8PathBuf,
}

impl FileSupervisor {
    /// Creates a supervisor writing into `output_dir`.
    #[must_use]
    pub fn new(output_dir: &Utf8Path) -> Self {
        Self {
            path: output_dir.join(PLAN_FILE),
        }
    }
}

impl ProcessSupervisor for FileSupervisor {
    fn submit(&self, plan: &WorkloadPlan) -> Result<ApplyOutcome, ApplyError> {
        write_if_changed("supervisor", &self.path, plan)
    }
}

/// Metrics sink writing scrape jobs to `scrape_jobs.json`.
#[derive(Debug, Clone)]
pub struct FileMetricsSink {
    path: Utf8PathBuf,
}

impl FileMetricsSink {
    /// Creates a sink writing into `output_dir`.
    #[must_use]
    pub fn new(output_dir: &Utf8Path) -> Self {
        Self {
            path: output_dir.join(SCRAPE_JOBS_FILE),
        }
    }
}

impl MetricsSink for FileMetricsSink {
    fn submit(&self, targets: &[ScrapeTarget]) -> Result<ApplyOutcome, ApplyError> {
        write_if_changed("metrics", &self.path, targets)
    }
}
