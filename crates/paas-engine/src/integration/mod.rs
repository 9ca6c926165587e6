//! Normalises raw orchestrator data into integration instances.
//!
//! Reading is a pure transform: the reader never guesses values for
//! mandatory fields, and repeated reads of the same data produce equal
//! instances. Data that arrives before provisioning completes yields a
//! pending instance; data for a detached integration is simply absent.

mod uri;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::debug;
use url::Url;

use crate::catalog::{Catalog, FieldShape, FieldSpec, IntegrationDescriptor, IntegrationKind};

pub use self::uri::ConnectionUri;

/// Data completeness of one integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Readiness {
    /// Not attached.
    Absent,
    /// Attached but still provisioning.
    Pending,
    /// All mandatory fields are present and valid.
    Ready,
}

/// Integration data exactly as the orchestrator exposes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawIntegrationData {
    /// Published key-value pairs.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// Addresses of the backing service's units, in orchestrator order.
    #[serde(default)]
    pub units: Vec<String>,
}

/// One integration as observed during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationInstance {
    descriptor: IntegrationDescriptor,
    readiness: Readiness,
    reason: Option<String>,
    fields: BTreeMap<String, String>,
    connection: Option<ConnectionUri>,
    unit_addresses: Vec<String>,
}

impl IntegrationInstance {
    /// Descriptor this instance was read against.
    #[must_use]
    pub const fn descriptor(&self) -> &IntegrationDescriptor {
        &self.descriptor
    }

    /// Integration kind.
    #[must_use]
    pub const fn kind(&self) -> IntegrationKind {
        self.descriptor.kind()
    }

    /// Observed readiness.
    #[must_use]
    pub const fn readiness(&self) -> Readiness {
        self.readiness
    }

    /// Whether the instance is ready.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.readiness, Readiness::Ready)
    }

    /// Why the instance is pending.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Normalised fields; empty unless ready.
    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Returns a normalised field value.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Connection URI, for integrations that publish or compose one.
    #[must_use]
    pub const fn connection(&self) -> Option<&ConnectionUri> {
        self.connection.as_ref()
    }

    /// Backing service unit addresses in orchestrator order.
    #[must_use]
    pub fn unit_addresses(&self) -> &[String] {
        &self.unit_addresses
    }

    const fn absent(descriptor: IntegrationDescriptor) -> Self {
        Self {
            descriptor,
            readiness: Readiness::Absent,
            reason: None,
            fields: BTreeMap::new(),
            connection: None,
            unit_addresses: Vec::new(),
        }
    }

    const fn pending(descriptor: IntegrationDescriptor, reason: String) -> Self {
        Self {
            descriptor,
            readiness: Readiness::Pending,
            reason: Some(reason),
            fields: BTreeMap::new(),
            connection: None,
            unit_addresses: Vec::new(),
        }
    }
}

enum FieldValue {
    Present(String),
    Missing,
    Invalid(String),
}

fn normalise(spec: &FieldSpec, raw: Option<&String>) -> FieldValue {
    let Some(value) = raw
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
    else {
        return FieldValue::Missing;
    };
    match spec.shape() {
        FieldShape::Text => FieldValue::Present(value.to_owned()),
        FieldShape::Port => match value.parse::<u16>() {
            Ok(port) if port > 0 => FieldValue::Present(port.to_string()),
            _ => FieldValue::Invalid(format!("'{value}' is not a valid port")),
        },
        FieldShape::FirstListItem => value
            .split(',')
            .map(str::trim)
            .find(|item| !item.is_empty())
            .map_or(FieldValue::Missing, |item| FieldValue::Present(item.to_owned())),
        FieldShape::NoneIsAbsent if value.eq_ignore_ascii_case("none") => FieldValue::Missing,
        FieldShape::NoneIsAbsent => FieldValue::Present(value.to_owned()),
        FieldShape::Url => match Url::parse(value) {
            Ok(_) => FieldValue::Present(value.to_owned()),
            Err(error) => FieldValue::Invalid(format!("'{value}' is not a valid URL: {error}")),
        },
    }
}

/// Reads one integration.
///
/// Missing data yields an absent instance. A missing or invalid mandatory
/// field, an invalid optional field, or data that cannot form the connection
/// URI yields a pending instance carrying the reason. Unit addresses are kept
/// whatever their number, since a replicated backing service reports one per
/// unit.
#[must_use]
pub fn read_integration(
    descriptor: &IntegrationDescriptor,
    raw: Option<&RawIntegrationData>,
) -> IntegrationInstance {
    let Some(data) = raw else {
        return IntegrationInstance::absent(*descriptor);
    };

    let mut fields = BTreeMap::new();
    for spec in descriptor.fields() {
        match normalise(spec, data.fields.get(spec.key())) {
            FieldValue::Present(value) => {
                fields.insert(spec.key().to_owned(), value);
            }
            FieldValue::Missing if spec.is_mandatory() => {
                return IntegrationInstance::pending(
                    *descriptor,
                    format!("missing mandatory field '{}'", spec.key()),
                );
            }
            FieldValue::Missing => {}
            FieldValue::Invalid(message) => {
                return IntegrationInstance::pending(
                    *descriptor,
                    format!("field '{}': {message}", spec.key()),
                );
            }
        }
    }

    let unit_addresses: Vec<String> = data
        .units
        .iter()
        .map(|address| address.trim())
        .filter(|address| !address.is_empty())
        .map(str::to_owned)
        .collect();

    let connection = match uri::connection_uri(descriptor.uri(), &fields) {
        Ok(connection) => connection,
        Err(message) => {
            return IntegrationInstance::pending(
                *descriptor,
                format!("cannot derive connection URI: {message}"),
            );
        }
    };

    IntegrationInstance {
        descriptor: *descriptor,
        readiness: Readiness::Ready,
        reason: None,
        fields,
        connection,
        unit_addresses,
    }
}

/// Why a workload cannot start yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocker<'a> {
    /// A required integration is not ready.
    Required(&'a IntegrationInstance),
    /// No integration of a group the workload needs one of is ready.
    NoneReady(&'a [IntegrationKind]),
}

/// Every catalog integration as observed during one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationSet {
    instances: BTreeMap<IntegrationKind, IntegrationInstance>,
    required_any: &'static [IntegrationKind],
}

impl IntegrationSet {
    /// Reads every catalog entry from `raw`, keyed by integration name.
    ///
    /// Raw data for names the catalog does not know is ignored.
    #[must_use]
    pub fn read(catalog: &Catalog, raw: &BTreeMap<String, RawIntegrationData>) -> Self {
        for name in raw.keys() {
            if catalog.get_by_name(name).is_none() {
                debug!(
                    target: "paas_engine::reconcile",
                    integration = name.as_str(),
                    "ignoring data for unknown integration"
                );
            }
        }
        let instances = catalog
            .iter()
            .map(|descriptor| {
                (
                    descriptor.kind(),
                    read_integration(descriptor, raw.get(descriptor.name())),
                )
            })
            .collect();
        Self {
            instances,
            required_any: catalog.required_any(),
        }
    }

    /// Looks up the instance for `kind`.
    #[must_use]
    pub fn get(&self, kind: IntegrationKind) -> Option<&IntegrationInstance> {
        self.instances.get(&kind)
    }

    /// Iterates every instance in stable kind order.
    pub fn iter(&self) -> impl Iterator<Item = &IntegrationInstance> {
        self.instances.values()
    }

    /// Iterates ready instances in stable kind order.
    pub fn ready(&self) -> impl Iterator<Item = &IntegrationInstance> {
        self.iter().filter(|instance| instance.is_ready())
    }

    /// Conditions keeping the workload from starting.
    ///
    /// Required instances that are not ready come first, in stable kind
    /// order, followed by the required group when none of its members is
    /// ready.
    #[must_use]
    pub fn blocking(&self) -> Vec<Blocker<'_>> {
        let mut blockers: Vec<Blocker<'_>> = self
            .iter()
            .filter(|instance| instance.descriptor().is_required() && !instance.is_ready())
            .map(Blocker::Required)
            .collect();
        let group_ready = self
            .required_any
            .iter()
            .any(|kind| self.get(*kind).is_some_and(IntegrationInstance::is_ready));
        if !self.required_any.is_empty() && !group_ready {
            blockers.push(Blocker::NoneReady(self.required_any));
        }
        blockers
    }

    /// Whether a ready integration can carry asynchronous tasks.
    #[must_use]
    pub fn has_ready_task_broker(&self) -> bool {
        self.ready()
            .any(|instance| instance.descriptor().is_task_broker())
    }
}
