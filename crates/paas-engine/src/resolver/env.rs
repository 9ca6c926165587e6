//! Variables contributed by ready integrations.

use crate::catalog::DerivedEnv;
use crate::integration::{ConnectionUri, IntegrationInstance};

fn netloc(uri: &ConnectionUri) -> String {
    let url = uri.url();
    let mut netloc = String::new();
    if !url.username().is_empty() || url.password().is_some() {
        netloc.push_str(url.username());
        if let Some(password) = url.password() {
            netloc.push(':');
            netloc.push_str(password);
        }
        netloc.push('@');
    }
    netloc.push_str(url.host_str().unwrap_or_default());
    if let Some(port) = url.port() {
        netloc.push(':');
        netloc.push_str(&port.to_string());
    }
    netloc
}

fn uri_family(prefix: &str, uri: &ConnectionUri, out: &mut Vec<(String, String)>) {
    let url = uri.url();
    let mut push = |suffix: &str, value: &str| {
        out.push((format!("{prefix}{suffix}"), value.to_owned()));
    };
    push("CONNECT_STRING", uri.as_str());
    push("SCHEME", url.scheme());
    push("NETLOC", &netloc(uri));
    push("PATH", url.path());
    push("PARAMS", "");
    push("QUERY", url.query().unwrap_or_default());
    push("FRAGMENT", url.fragment().unwrap_or_default());
    push("HOSTNAME", url.host_str().unwrap_or_default());
    if !url.username().is_empty() {
        push("USERNAME", url.username());
    }
    if let Some(password) = url.password() {
        push("PASSWORD", password);
    }
    if let Some(port) = url.port() {
        push("PORT", &port.to_string());
    }
    let name = url.path().trim_start_matches('/');
    if uri.exports_name() && !name.is_empty() {
        push("NAME", name);
    }
}

fn derived(
    prefix: &str,
    rule: &DerivedEnv,
    instance: &IntegrationInstance,
    app_name: &str,
) -> Option<(String, String)> {
    match *rule {
        DerivedEnv::ServiceName { env } => Some((format!("{prefix}{env}"), app_name.to_owned())),
        DerivedEnv::Translate { env, from, table } => {
            let value = instance.field(from)?;
            table
                .iter()
                .find(|(source, _)| source.eq_ignore_ascii_case(value))
                .map(|(_, target)| (format!("{prefix}{env}"), (*target).to_owned()))
        }
        DerivedEnv::ScopeKwargs { env, from } => {
            let scope = instance.field(from)?;
            let kwargs = serde_json::json!({ "scope": scope });
            Some((format!("{prefix}{env}"), kwargs.to_string()))
        }
    }
}

/// Lists the variables a ready integration exports, in a fixed order.
pub(crate) fn integration_env(
    instance: &IntegrationInstance,
    config_prefix: &str,
    app_name: &str,
) -> Vec<(String, String)> {
    let descriptor = instance.descriptor();
    let prefix = descriptor.env_prefix(config_prefix);
    let mut out = Vec::new();

    for spec in descriptor.fields() {
        if let (Some(env), Some(value)) = (spec.env(), instance.field(spec.key())) {
            out.push((format!("{prefix}{env}"), value.to_owned()));
        }
    }
    if let Some(uri) = instance.connection() {
        uri_family(&prefix, uri, &mut out);
    }
    if descriptor.is_replicated() && !instance.unit_addresses().is_empty() {
        out.push((format!("{prefix}HOSTS"), instance.unit_addresses().join(",")));
        for (index, address) in instance.unit_addresses().iter().enumerate() {
            out.push((format!("{prefix}HOST_{index}"), address.clone()));
        }
    }
    out.extend(
        descriptor
            .derived()
            .iter()
            .filter_map(|rule| derived(&prefix, rule, instance, app_name)),
    );
    out
}
