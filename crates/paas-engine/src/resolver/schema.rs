//! Checks user options against their declarations.

use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::snapshot::{OptionSpec, OptionValue};

/// Rejects options of the wrong type, then non-optional options left unset.
///
/// Every unset non-optional option is named in one error, in name order.
pub(crate) fn check(
    schema: &BTreeMap<String, OptionSpec>,
    options: &BTreeMap<String, OptionValue>,
) -> Result<(), ValidationError> {
    for (name, value) in options {
        let Some(spec) = schema.get(name) else {
            continue;
        };
        if value.kind() != spec.kind {
            return Err(ValidationError::new(
                format!("options.{name}"),
                format!("expected a {} value, found {}", spec.kind, value.kind()),
            ));
        }
    }

    let missing: Vec<&str> = schema
        .iter()
        .filter(|(name, spec)| !spec.optional && !options.contains_key(name.as_str()))
        .map(|(name, _)| name.as_str())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(
            "options",
            format!("non-optional options are unset: {}", missing.join(", ")),
        ))
    }
}
