//! Secrets stored as one JSON object per identifier.

use std::collections::BTreeMap;
use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};

use paas_engine::secret::{SecretContent, SecretId, SecretStore, SecretStoreError};

/// Secret store reading `<dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct DirectorySecretStore {
    directory: Utf8PathBuf,
}

impl DirectorySecretStore {
    /// Creates a store rooted at `directory`.
    #[must_use]
    pub fn new(directory: &Utf8Path) -> Self {
        Self {
            directory: directory.to_owned(),
        }
    }

    fn path_for(&self, id: &SecretId) -> Result<Utf8PathBuf, SecretStoreError> {
        let name = id.as_str();
        let escapes = name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\'])
            || name.contains("..");
        if escapes {
            return Err(SecretStoreError::new(format!(
                "secret identifier '{name}' is not a valid file name"
            )));
        }
        Ok(self.directory.join(format!("{name}.json")))
    }
}

impl SecretStore for DirectorySecretStore {
    fn fetch(&self, id: &SecretId) -> Result<SecretContent, SecretStoreError> {
        let path = self.path_for(id)?;
        let text = fs::read_to_string(&path).map_err(|error| {
            if error.kind() == io::ErrorKind::NotFound {
                SecretStoreError::new(format!("secret '{id}' not found"))
            } else {
                SecretStoreError::new(format!("cannot read '{path}': {error}"))
            }
        })?;
        serde_json::from_str::<BTreeMap<String, String>>(&text).map_err(|error| {
            SecretStoreError::new(format!(
                "secret '{id}' is not an object of strings: {error}"
            ))
        })
    }
}
