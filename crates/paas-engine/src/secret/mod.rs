//! References to externally held secrets and their per-pass resolution.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::SecretResolutionError;

/// Opaque identifier of a secret held by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretId(String);

impl SecretId {
    /// Wraps an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SecretId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Secret content: key-value pairs.
pub type SecretContent = BTreeMap<String, String>;

/// Where a secret-typed option takes its value from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretReference {
    /// An inline value, equivalent to a secret with the single key `value`.
    Literal(String),
    /// A secret held by the orchestrator.
    #[serde(rename = "secret")]
    Stored(SecretId),
}

/// Failure reported by a [`SecretStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SecretStoreError {
    message: String,
}

impl SecretStoreError {
    /// Creates a store failure.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Collaborator that reads secret content by identifier.
///
/// A call may block briefly; the engine never retries it within a pass.
pub trait SecretStore {
    /// Fetches the content of `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SecretStoreError`] when the secret is missing or cannot be
    /// read.
    fn fetch(&self, id: &SecretId) -> Result<SecretContent, SecretStoreError>;
}

impl<T: SecretStore + ?Sized> SecretStore for Arc<T> {
    fn fetch(&self, id: &SecretId) -> Result<SecretContent, SecretStoreError> {
        self.as_ref().fetch(id)
    }
}

/// Resolves secret references for one pass, fetching each identifier at
/// most once.
pub struct PassSecrets<'a, S: SecretStore + ?Sized> {
    store: &'a S,
    fetched: BTreeMap<SecretId, Result<SecretContent, SecretStoreError>>,
}

impl<'a, S: SecretStore + ?Sized> PassSecrets<'a, S> {
    /// Starts a pass over `store`.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self {
            store,
            fetched: BTreeMap::new(),
        }
    }

    /// Resolves `reference`, held by the option `option`.
    ///
    /// # Errors
    ///
    /// Returns [`SecretResolutionError::Unavailable`] when the store cannot
    /// produce the secret.
    pub fn resolve(
        &mut self,
        option: &str,
        reference: &SecretReference,
    ) -> Result<SecretContent, SecretResolutionError> {
        let id = match reference {
            SecretReference::Literal(value) => {
                return Ok(BTreeMap::from([(String::from("value"), value.clone())]));
            }
            SecretReference::Stored(id) => id,
        };
        let store = self.store;
        self.fetched
            .entry(id.clone())
            .or_insert_with(|| store.fetch(id))
            .clone()
            .map_err(|error| SecretResolutionError::Unavailable {
                id: id.to_string(),
                option: option.to_owned(),
                message: error.to_string(),
            })
    }

    /// Number of distinct identifiers fetched so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetched.len()
    }
}

#[cfg(test)]
mod tests;
