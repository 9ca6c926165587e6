//! Reads the world snapshot from disk.

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};

use paas_engine::error::OrchestratorError;
use paas_engine::{Orchestrator, WorldSnapshot};

/// Orchestrator backed by a JSON snapshot file.
///
/// When the snapshot carries no customization text, the customization file is
/// read instead; a missing customization file means no customization.
#[derive(Debug, Clone)]
pub struct FileOrchestrator {
    snapshot_path: Utf8PathBuf,
    customization_path: Utf8PathBuf,
}

impl FileOrchestrator {
    /// Creates an orchestrator reading `snapshot_path` on every pass.
    #[must_use]
    pub fn new(snapshot_path: &Utf8Path, customization_path: &Utf8Path) -> Self {
        Self {
            snapshot_path: snapshot_path.to_owned(),
            customization_path: customization_path.to_owned(),
        }
    }

    fn customization(&self) -> Result<Option<String>, OrchestratorError> {
        match fs::read_to_string(&self.customization_path) {
            Ok(text) => Ok(Some(text)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(OrchestratorError::new(format!(
                "cannot read customization '{}': {error}",
                self.customization_path
            ))),
        }
    }
}

impl Orchestrator for FileOrchestrator {
    fn snapshot(&self) -> Result<WorldSnapshot, OrchestratorError> {
        let text = fs::read_to_string(&self.snapshot_path).map_err(|error| {
            OrchestratorError::new(format!(
                "cannot read snapshot '{}': {error}",
                self.snapshot_path
            ))
        })?;
        let mut snapshot: WorldSnapshot = serde_json::from_str(&text).map_err(|error| {
            OrchestratorError::new(format!(
                "snapshot '{}' is not valid: {error}",
                self.snapshot_path
            ))
        })?;
        if snapshot.customization.is_none() {
            snapshot.customization = self.customization()?;
        }
        Ok(snapshot)
    }
}
