//! Unit tests for snapshot decoding.

use rstest::rstest;

use super::*;
use crate::secret::SecretId;

#[rstest]
#[case::string(r#""hello""#, OptionValue::String(String::from("hello")))]
#[case::int("42", OptionValue::Int(42))]
#[case::bool("true", OptionValue::Bool(true))]
#[case::secret(
    r#"{"secret": "secret:abc"}"#,
    OptionValue::Secret(SecretReference::Stored(SecretId::new("secret:abc")))
)]
fn option_values_decode_by_shape(#[case] json: &str, #[case] expected: OptionValue) {
    let decoded: OptionValue = serde_json::from_str(json).expect("decode option");
    assert_eq!(decoded, expected);
}

#[rstest]
#[case::bool(OptionValue::Bool(false), Some("false"))]
#[case::int(OptionValue::Int(-3), Some("-3"))]
#[case::secret(OptionValue::Secret(SecretReference::Literal(String::from("x"))), None)]
fn plain_values_render_as_text(#[case] value: OptionValue, #[case] expected: Option<&str>) {
    assert_eq!(value.plain_value().as_deref(), expected);
}

#[test]
fn snapshot_decodes_with_defaults() {
    let json = r#"{
        "options": {"flask-debug": true},
        "integrations": {"redis": {"fields": {"url": "redis://10.0.0.7:6379"}}},
        "units": [{"name": "app/0", "address": "10.0.0.1", "ready": true}]
    }"#;
    let snapshot: WorldSnapshot = serde_json::from_str(json).expect("decode snapshot");
    assert_eq!(snapshot.options.len(), 1);
    assert!(snapshot.customization.is_none());
    assert_eq!(snapshot.units.units().len(), 1);
    assert_eq!(snapshot.services, ServiceRequest::default());
}

#[test]
fn snapshot_rejects_unknown_sections() {
    let result = serde_json::from_str::<WorldSnapshot>(r#"{"relations": {}}"#);
    assert!(result.is_err());
}

#[test]
fn option_schema_defaults_to_optional() {
    let json = r#"{"option_schema": {
        "api-token": {"type": "secret", "optional": false},
        "banner": {"type": "string"}
    }}"#;
    let snapshot: WorldSnapshot = serde_json::from_str(json).expect("decode snapshot");
    let token = snapshot.option_schema.get("api-token").expect("declared");
    assert_eq!(token.kind, OptionType::Secret);
    assert!(!token.optional);
    assert!(snapshot.option_schema.get("banner").expect("declared").optional);
}

#[test]
fn option_schema_rejects_unknown_types() {
    let json = r#"{"option_schema": {"ratio": {"type": "float"}}}"#;
    assert!(serde_json::from_str::<WorldSnapshot>(json).is_err());
}

#[rstest]
#[case(OptionValue::Bool(true), "boolean")]
#[case(OptionValue::Int(1), "int")]
#[case(OptionValue::String(String::from("x")), "string")]
#[case(OptionValue::Secret(SecretReference::Literal(String::from("x"))), "secret")]
fn option_values_report_their_type(#[case] value: OptionValue, #[case] name: &str) {
    assert_eq!(value.kind().to_string(), name);
}
