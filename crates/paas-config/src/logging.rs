//! Log output settings for the driver.
//!
//! The driver writes one event per pass transition and per collaborator
//! submission. Operators pick how those events are rendered with
//! `PAAS_LOG_FORMAT` or `--log-format`.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Rendering of the driver's log events on standard error.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event with the event fields flattened, for
    /// collectors that index reconciliation outcomes.
    #[default]
    Json,
    /// Single-line text for an operator watching a terminal.
    Compact,
}

impl LogFormat {
    /// Whether events carry machine-readable fields.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Rejection of an unknown `--log-format` value.
pub type LogFormatParseError = strum::ParseError;

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("json", LogFormat::Json)]
    #[case("JSON", LogFormat::Json)]
    #[case("Compact", LogFormat::Compact)]
    fn formats_parse_case_insensitively(#[case] text: &str, #[case] expected: LogFormat) {
        assert_eq!(LogFormat::from_str(text), Ok(expected));
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(LogFormat::from_str("pretty").is_err());
    }

    #[test]
    fn only_json_is_structured() {
        assert!(LogFormat::Json.is_structured());
        assert!(!LogFormat::Compact.is_structured());
    }
}
