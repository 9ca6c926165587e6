//! Unit tests for per-pass secret resolution.

use mockall::mock;
use mockall::predicate::eq;

use super::*;

mock! {
    Store {}
    impl SecretStore for Store {
        fn fetch(&self, id: &SecretId) -> Result<SecretContent, SecretStoreError>;
    }
}

fn content(pairs: &[(&str, &str)]) -> SecretContent {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}

#[test]
fn literal_references_never_reach_the_store() {
    let mut store = MockStore::new();
    store.expect_fetch().never();
    let mut secrets = PassSecrets::new(&store);
    let resolved = secrets
        .resolve("api-key-id", &SecretReference::Literal(String::from("inline")))
        .expect("literal resolves");
    assert_eq!(resolved, content(&[("value", "inline")]));
}

#[test]
fn each_identifier_is_fetched_once_per_pass() {
    let mut store = MockStore::new();
    store
        .expect_fetch()
        .with(eq(SecretId::new("secret:1")))
        .times(1)
        .returning(|_| Ok(content(&[("value", "s3cr3t")])));
    let mut secrets = PassSecrets::new(&store);
    let reference = SecretReference::Stored(SecretId::new("secret:1"));
    let first = secrets.resolve("a-id", &reference).expect("first fetch");
    let second = secrets.resolve("b-id", &reference).expect("cached fetch");
    assert_eq!(first, second);
    assert_eq!(secrets.fetch_count(), 1);
}

#[test]
fn store_failure_names_option_and_id() {
    let mut store = MockStore::new();
    store
        .expect_fetch()
        .times(1)
        .returning(|_| Err(SecretStoreError::new("permission denied")));
    let mut secrets = PassSecrets::new(&store);
    let error = secrets
        .resolve(
            "flask-secret-key-id",
            &SecretReference::Stored(SecretId::new("secret:9")),
        )
        .expect_err("fetch fails");
    assert_eq!(
        error,
        SecretResolutionError::Unavailable {
            id: String::from("secret:9"),
            option: String::from("flask-secret-key-id"),
            message: String::from("permission denied"),
        }
    );
}

#[test]
fn references_deserialise_from_tagged_form() {
    let stored: SecretReference =
        serde_json::from_str(r#"{"secret": "secret:abc"}"#).expect("stored form");
    assert_eq!(stored, SecretReference::Stored(SecretId::new("secret:abc")));
    let literal: SecretReference =
        serde_json::from_str(r#"{"literal": "x"}"#).expect("literal form");
    assert_eq!(literal, SecretReference::Literal(String::from("x")));
}
