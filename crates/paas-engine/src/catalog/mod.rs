//! Static description of the integrations and workload kinds the engine
//! understands.
//!
//! Integration kinds form a closed set. Each kind carries its field schema as
//! data ([`IntegrationSchema`]) so that adding an integration means extending
//! a table rather than writing new resolution code. A [`Catalog`] binds those
//! schemas to a workload kind, fixing which integrations are required.

mod kinds;
mod profile;

use std::collections::BTreeMap;

use paas_config::WorkloadKind;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::error::CatalogError;

pub use self::profile::{
    FrameworkOption, HostListOption, MetricsProfile, TaskSupport, WorkloadProfile,
};

/// Every integration kind the engine can consume.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum IntegrationKind {
    /// PostgreSQL database.
    Postgresql,
    /// MySQL database.
    Mysql,
    /// MongoDB database.
    Mongodb,
    /// Redis key-value store, usable as a task broker.
    Redis,
    /// RabbitMQ message broker, usable as a task broker.
    Rabbitmq,
    /// S3-compatible object storage.
    S3,
    /// SAML identity provider.
    Saml,
    /// OpenID Connect identity provider.
    Oidc,
    /// SMTP mail relay.
    Smtp,
    /// OTLP tracing collector.
    Tracing,
    /// OpenFGA authorisation service.
    Openfga,
    /// Reverse proxy publishing the workload.
    Ingress,
}

impl IntegrationKind {
    /// Returns the canonical integration name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Whether a workload can run without an integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Requirement {
    /// The workload must not start without it.
    Required,
    /// The workload runs with or without it.
    Optional,
}

/// How a raw field value is validated and normalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// Any non-blank text.
    Text,
    /// A TCP port in `1..=65535`.
    Port,
    /// The first entry of a comma-separated list.
    FirstListItem,
    /// Text where the literal `none` means the field is unset.
    NoneIsAbsent,
    /// An absolute URL with a numeric port when one is given.
    Url,
}

/// One datum an integration may publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    key: &'static str,
    env: Option<&'static str>,
    mandatory: bool,
    shape: FieldShape,
}

impl FieldSpec {
    /// A mandatory field exported as `<prefix><env>`.
    #[must_use]
    pub const fn mandatory(key: &'static str, env: &'static str) -> Self {
        Self {
            key,
            env: Some(env),
            mandatory: true,
            shape: FieldShape::Text,
        }
    }

    /// An optional field exported as `<prefix><env>`.
    #[must_use]
    pub const fn optional(key: &'static str, env: &'static str) -> Self {
        Self {
            key,
            env: Some(env),
            mandatory: false,
            shape: FieldShape::Text,
        }
    }

    /// A mandatory field that only feeds URI composition.
    #[must_use]
    pub const fn internal(key: &'static str) -> Self {
        Self {
            key,
            env: None,
            mandatory: true,
            shape: FieldShape::Text,
        }
    }

    /// Overrides the validation shape.
    #[must_use]
    pub const fn with_shape(mut self, shape: FieldShape) -> Self {
        self.shape = shape;
        self
    }

    /// Marks the field optional.
    #[must_use]
    pub const fn not_mandatory(mut self) -> Self {
        self.mandatory = false;
        self
    }

    /// Key under which the orchestrator publishes the field.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }

    /// Variable suffix, when the field is exported directly.
    #[must_use]
    pub const fn env(&self) -> Option<&'static str> {
        self.env
    }

    /// Whether readiness depends on this field.
    #[must_use]
    pub const fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    /// Validation shape.
    #[must_use]
    pub const fn shape(&self) -> FieldShape {
        self.shape
    }
}

/// Recipe for assembling a connection URI from discrete fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UriTemplate {
    /// URI scheme.
    pub scheme: &'static str,
    /// Port used when the host field carries none.
    pub default_port: u16,
    /// Field holding `host[:port]`.
    pub host: &'static str,
    /// Field holding the user name.
    pub username: &'static str,
    /// Field holding the password.
    pub password: &'static str,
    /// Field holding the path component, if any.
    pub path: Option<&'static str>,
    /// Percent-encode the whole path value as one segment.
    pub encode_path: bool,
    /// Export the path as `<prefix>NAME`.
    pub exports_name: bool,
}

/// Source of the URI expanded into the `CONNECT_STRING` variable family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriSource {
    /// The integration exports no URI.
    None,
    /// A single field already holds the URI.
    FromField(&'static str),
    /// The URI is assembled from several fields.
    Compose(UriTemplate),
}

/// Variables computed from integration data and workload context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedEnv {
    /// `<prefix><env>` is set to the application name.
    ServiceName {
        /// Variable suffix.
        env: &'static str,
    },
    /// `<prefix><env>` is set by translating another field's value.
    Translate {
        /// Variable suffix.
        env: &'static str,
        /// Source field key.
        from: &'static str,
        /// Value translation pairs; unmatched values are not exported.
        table: &'static [(&'static str, &'static str)],
    },
    /// `<prefix><env>` is set to a JSON object `{"scope": <field>}`.
    ScopeKwargs {
        /// Variable suffix.
        env: &'static str,
        /// Source field key.
        from: &'static str,
    },
}

/// Data-only schema shared by every descriptor of one kind.
#[derive(Debug, PartialEq, Eq)]
pub struct IntegrationSchema {
    /// Variable prefix for every exported field.
    pub env_prefix: &'static str,
    /// Whether the workload configuration prefix precedes `env_prefix`.
    pub scoped: bool,
    /// Whether the integration can carry asynchronous tasks.
    pub task_broker: bool,
    /// Upper bound on attached instances of this integration.
    pub max_instances: usize,
    /// Published fields.
    pub fields: &'static [FieldSpec],
    /// Connection URI source.
    pub uri: UriSource,
    /// Computed variables.
    pub derived: &'static [DerivedEnv],
}

/// Immutable description of one integration for one workload kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrationDescriptor {
    kind: IntegrationKind,
    requirement: Requirement,
    schema: &'static IntegrationSchema,
}

impl IntegrationDescriptor {
    /// Creates a descriptor using the kind's static schema.
    #[must_use]
    pub const fn new(kind: IntegrationKind, requirement: Requirement) -> Self {
        Self {
            kind,
            requirement,
            schema: kinds::schema(kind),
        }
    }

    /// Integration kind.
    #[must_use]
    pub const fn kind(&self) -> IntegrationKind {
        self.kind
    }

    /// Canonical name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Required or optional.
    #[must_use]
    pub const fn requirement(&self) -> Requirement {
        self.requirement
    }

    /// Whether the workload cannot run without this integration.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        matches!(self.requirement, Requirement::Required)
    }

    /// Upper bound on attached instances.
    #[must_use]
    pub const fn max_instances(&self) -> usize {
        self.schema.max_instances
    }

    /// Whether the integration admits several instances, so that unit
    /// addresses are exported as a host list.
    #[must_use]
    pub const fn is_replicated(&self) -> bool {
        self.schema.max_instances > 1
    }

    /// Whether this integration can carry asynchronous tasks.
    #[must_use]
    pub const fn is_task_broker(&self) -> bool {
        self.schema.task_broker
    }

    /// Published fields.
    #[must_use]
    pub const fn fields(&self) -> &'static [FieldSpec] {
        self.schema.fields
    }

    /// Connection URI source.
    #[must_use]
    pub const fn uri(&self) -> UriSource {
        self.schema.uri
    }

    /// Computed variables.
    #[must_use]
    pub const fn derived(&self) -> &'static [DerivedEnv] {
        self.schema.derived
    }

    /// Full variable prefix given the workload configuration prefix.
    #[must_use]
    pub fn env_prefix(&self, config_prefix: &str) -> String {
        if self.schema.scoped {
            format!("{config_prefix}{}", self.schema.env_prefix)
        } else {
            self.schema.env_prefix.to_owned()
        }
    }

    const fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirement = requirement;
        self
    }
}

/// The integration set a workload kind understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    descriptors: BTreeMap<IntegrationKind, IntegrationDescriptor>,
    required_any: &'static [IntegrationKind],
}

impl Catalog {
    /// Builds the catalog for `kind`, marking the profile's integrations
    /// required and every other integration optional. Members of the
    /// profile's required group stay optional individually.
    #[must_use]
    pub fn for_workload(kind: WorkloadKind) -> Self {
        let profile = WorkloadProfile::for_kind(kind);
        let descriptors = IntegrationKind::iter()
            .map(|integration| {
                let requirement = if profile.required.contains(&integration) {
                    Requirement::Required
                } else {
                    Requirement::Optional
                };
                (
                    integration,
                    IntegrationDescriptor::new(integration, requirement),
                )
            })
            .collect();
        Self {
            descriptors,
            required_any: profile.required_any,
        }
    }

    /// Promotes the named integration to required.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownIntegration`] when no integration has
    /// that name.
    pub fn require(&mut self, name: &str) -> Result<(), CatalogError> {
        let Ok(kind) = name.trim().parse::<IntegrationKind>() else {
            return Err(CatalogError::UnknownIntegration {
                name: name.to_owned(),
            });
        };
        if let Some(descriptor) = self.descriptors.get_mut(&kind) {
            *descriptor = descriptor.with_requirement(Requirement::Required);
        }
        Ok(())
    }

    /// Looks up the descriptor for `kind`.
    #[must_use]
    pub fn get(&self, kind: IntegrationKind) -> Option<&IntegrationDescriptor> {
        self.descriptors.get(&kind)
    }

    /// Looks up a descriptor by integration name.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&IntegrationDescriptor> {
        name.parse::<IntegrationKind>()
            .ok()
            .and_then(|kind| self.descriptors.get(&kind))
    }

    /// Iterates descriptors in stable kind order.
    pub fn iter(&self) -> impl Iterator<Item = &IntegrationDescriptor> {
        self.descriptors.values()
    }

    /// Integrations of which at least one must be ready; empty when the
    /// workload has no such requirement.
    #[must_use]
    pub const fn required_any(&self) -> &'static [IntegrationKind] {
        self.required_any
    }
}
