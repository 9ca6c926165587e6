//! Connection URIs published by, or assembled from, integration data.

use std::collections::BTreeMap;

use url::{Url, form_urlencoded};

use crate::catalog::{UriSource, UriTemplate};

/// A connection URI together with its parsed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionUri {
    text: String,
    url: Url,
    exports_name: bool,
}

impl ConnectionUri {
    /// The URI exactly as exported in `CONNECT_STRING`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    /// Parsed form.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Whether the path is exported as a database name.
    #[must_use]
    pub const fn exports_name(&self) -> bool {
        self.exports_name
    }
}

fn field<'a>(fields: &'a BTreeMap<String, String>, key: &str) -> Result<&'a str, String> {
    fields
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| format!("field '{key}' is required to compose the connection URI"))
}

fn compose(template: &UriTemplate, fields: &BTreeMap<String, String>) -> Result<Url, String> {
    let host = field(fields, template.host)?;
    let mut url = Url::parse(&format!("{}://{host}", template.scheme))
        .map_err(|error| format!("'{host}' is not a valid endpoint: {error}"))?;
    if url.port().is_none() {
        url.set_port(Some(template.default_port))
            .map_err(|()| format!("'{host}' cannot carry a port"))?;
    }
    url.set_username(field(fields, template.username)?)
        .map_err(|()| format!("'{host}' cannot carry credentials"))?;
    url.set_password(Some(field(fields, template.password)?))
        .map_err(|()| format!("'{host}' cannot carry credentials"))?;
    if let Some(value) = template.path.and_then(|key| fields.get(key)) {
        let segment: String = if template.encode_path {
            form_urlencoded::byte_serialize(value.as_bytes()).collect()
        } else {
            value.trim_start_matches('/').to_owned()
        };
        url.set_path(&format!("/{segment}"));
    }
    Ok(url)
}

/// Derives the connection URI for `source` from normalised fields.
///
/// # Errors
///
/// Returns a description of the problem when the URI cannot be parsed or
/// assembled.
pub(super) fn connection_uri(
    source: UriSource,
    fields: &BTreeMap<String, String>,
) -> Result<Option<ConnectionUri>, String> {
    match source {
        UriSource::None => Ok(None),
        UriSource::FromField(key) => {
            let Some(text) = fields.get(key) else {
                return Ok(None);
            };
            let url = Url::parse(text)
                .map_err(|error| format!("'{text}' is not a valid URL: {error}"))?;
            Ok(Some(ConnectionUri {
                text: text.clone(),
                url,
                exports_name: true,
            }))
        }
        UriSource::Compose(template) => {
            let url = compose(&template, fields)?;
            Ok(Some(ConnectionUri {
                text: url.as_str().to_owned(),
                url,
                exports_name: template.exports_name,
            }))
        }
    }
}
