#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use bwledger_core::model::Role;
use bwledger_gateway::config;

const MINIMAL: &str = r#"
version: 1
users:
  - id: "admin"
    username: "admin"
    email: "admin@example.com"
    role: admin
    ticket: "dev-admin"
"#;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
gateway:
  listen: "0.0.0.0:8080"
  allow_sigup: true # typo should fail
users:
  - id: "admin"
    username: "admin"
    email: "admin@example.com"
    role: admin
    ticket: "dev-admin"
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "INVALID_ARGUMENT");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str(MINIMAL).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.gateway.listen, "0.0.0.0:8080");
    assert!(cfg.gateway.allow_signup);
    assert_eq!(cfg.users[0].role, Role::Admin);
}

#[test]
fn rejects_unsupported_version() {
    let err = config::load_from_str(&MINIMAL.replace("version: 1", "version: 2")).unwrap_err();
    assert!(err.to_string().contains("unsupported config version"));
}

#[test]
fn requires_an_admin() {
    let no_admin = MINIMAL.replace("role: admin", "role: user");
    let err = config::load_from_str(&no_admin).unwrap_err();
    assert!(err.to_string().contains("at least one admin"));
}

#[test]
fn rejects_unknown_role() {
    let bad = MINIMAL.replace("role: admin", "role: root");
    assert!(config::load_from_str(&bad).is_err());
}

#[test]
fn rejects_bad_listen_addr() {
    let bad = format!("{MINIMAL}gateway:\n  listen: \"not-an-addr\"\n");
    let err = config::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("gateway.listen"));
}

#[test]
fn rejects_duplicate_tickets() {
    let dup = format!(
        "{MINIMAL}  - id: \"u1\"\n    username: \"alice\"\n    email: \"alice@example.com\"\n    role: user\n    ticket: \"dev-admin\"\n"
    );
    let err = config::load_from_str(&dup).unwrap_err();
    assert!(err.to_string().contains("duplicate user ticket"));
}

#[test]
fn rejects_blank_fields() {
    let blank = MINIMAL.replace("username: \"admin\"", "username: \"  \"");
    let err = config::load_from_str(&blank).unwrap_err();
    assert!(err.to_string().contains("users[].username"));
}
