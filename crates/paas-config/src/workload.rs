//! Workload kinds understood by the reconciliation engine.
//!
//! The kind selects the framework profile: configuration prefix, default
//! environment, process commands, and which integrations are mandatory.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Framework runtime wrapped by the managed workload.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Deserialize,
    Serialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumString,
    EnumIter,
    Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum WorkloadKind {
    /// Flask application served by gunicorn.
    #[default]
    Flask,
    /// Django application served by gunicorn.
    Django,
    /// FastAPI application served by uvicorn.
    Fastapi,
    /// Statically linked Go binary.
    Go,
    /// Express.js application run through npm.
    Expressjs,
    /// Spring Boot fat jar.
    SpringBoot,
}

impl WorkloadKind {
    /// Returns the canonical kebab-case name used in service names and
    /// option prefixes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flask => "flask",
            Self::Django => "django",
            Self::Fastapi => "fastapi",
            Self::Go => "go",
            Self::Expressjs => "expressjs",
            Self::SpringBoot => "spring-boot",
        }
    }

    /// Whether the workload is served through gunicorn.
    #[must_use]
    pub const fn is_gunicorn(self) -> bool {
        matches!(self, Self::Flask | Self::Django)
    }
}

/// Errors encountered while parsing a [`WorkloadKind`] from text.
pub type WorkloadKindParseError = strum::ParseError;

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;
    use strum::IntoEnumIterator;

    use super::*;

    #[rstest]
    #[case::flask("flask", WorkloadKind::Flask)]
    #[case::upper("DJANGO", WorkloadKind::Django)]
    #[case::kebab("spring-boot", WorkloadKind::SpringBoot)]
    fn parses_case_insensitively(#[case] input: &str, #[case] expected: WorkloadKind) {
        assert_eq!(WorkloadKind::from_str(input).expect("parse kind"), expected);
    }

    #[test]
    fn display_matches_canonical_name() {
        for kind in WorkloadKind::iter() {
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(WorkloadKind::from_str("rails").is_err());
    }
}
