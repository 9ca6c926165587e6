//! Driver bootstrap: configuration, telemetry, output directory, engine.

use std::fs;
use std::io;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use paas_config::Config;
use paas_engine::error::CatalogError;
use paas_engine::{Collaborators, EngineSettings, Reconciler, StructuredReconcileReporter};

use crate::collaborators::{DirectorySecretStore, FileMetricsSink, FileOrchestrator, FileSupervisor};
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Reconciler wired to the file-backed collaborators.
pub type FileReconciler = Reconciler<
    FileOrchestrator,
    DirectorySecretStore,
    FileSupervisor,
    FileMetricsSink,
    StructuredReconcileReporter,
>;

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the driver configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader failure when no valid configuration is available.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader returning a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The output directory could not be created.
    #[error("failed to prepare output directory '{path}': {source}")]
    OutputDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The configured required integrations are not in the catalog.
    #[error("invalid required integrations: {source}")]
    Catalog {
        /// Underlying catalog error.
        #[source]
        source: CatalogError,
    },
}

/// A bootstrapped driver ready to reconcile.
pub struct Daemon {
    config: Config,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
    engine: FileReconciler,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Accessor for the health reporter.
    #[must_use]
    pub fn reporter(&self) -> Arc<dyn HealthReporter> {
        Arc::clone(&self.reporter)
    }

    /// Borrows the engine.
    #[must_use]
    pub const fn engine(&self) -> &FileReconciler {
        &self.engine
    }

    /// Mutably borrows the engine.
    pub const fn engine_mut(&mut self) -> &mut FileReconciler {
        &mut self.engine
    }

    /// Consumes the daemon, returning the engine.
    #[must_use]
    pub fn into_engine(self) -> FileReconciler {
        self.engine
    }
}

fn build_engine(config: &Config) -> Result<FileReconciler, CatalogError> {
    let settings = EngineSettings {
        kind: config.workload_kind(),
        app_name: config.app_name().to_owned(),
        required_integrations: config.required_integrations(),
    };
    let collaborators = Collaborators {
        orchestrator: FileOrchestrator::new(config.snapshot_path(), config.customization_path()),
        secrets: DirectorySecretStore::new(config.secrets_dir()),
        supervisor: FileSupervisor::new(config.output_dir()),
        metrics: FileMetricsSink::new(config.output_dir()),
    };
    Reconciler::new(settings, collaborators, StructuredReconcileReporter::new())
}

/// Bootstraps the driver using the supplied collaborators.
///
/// # Errors
///
/// Returns [`BootstrapError`] for the first failing step; the reporter is
/// notified before the error is returned.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();
    let fail = |error: BootstrapError| {
        reporter.bootstrap_failed(&error);
        error
    };

    let config = loader
        .load()
        .map_err(|source| fail(BootstrapError::Configuration { source }))?;
    let telemetry = telemetry::initialise(&config)
        .map_err(|source| fail(BootstrapError::Telemetry { source }))?;

    let output_dir = config.output_dir();
    fs::create_dir_all(output_dir).map_err(|source| {
        fail(BootstrapError::OutputDirectory {
            path: output_dir.to_owned(),
            source: Arc::new(source),
        })
    })?;

    let engine = build_engine(&config).map_err(|source| fail(BootstrapError::Catalog { source }))?;
    reporter.bootstrap_succeeded(&config);

    Ok(Daemon {
        config,
        telemetry,
        reporter,
        engine,
    })
}
