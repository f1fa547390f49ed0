//! Hook resolution against a live catalog

use crate::common::*;
use dbunit::{resolve, resolve_hook, Conventions, DbunitConfig, HookKind, QualifiedName};

fn unit(name: &str) -> QualifiedName {
    QualifiedName::new("public", name)
}

fn resolved(db: &dbunit::Database, unit_name: &str, kind: HookKind) -> Option<String> {
    resolve_hook(db.catalog(), &db.config().conventions, &unit(unit_name), kind)
        .map(|hook| hook.name().to_string())
}

#[test]
fn setup_falls_back_while_precondition_is_specific() {
    let db = fresh_db();
    register_noop(&db, "test_case_a_b");
    register_noop(&db, "test_setup_a");
    register_noop(&db, "test_precondition_a");
    register_noop(&db, "test_precondition_a_b");

    assert_eq!(
        resolved(&db, "test_case_a_b", HookKind::Setup).as_deref(),
        Some("public.test_setup_a")
    );
    assert_eq!(
        resolved(&db, "test_case_a_b", HookKind::Precondition).as_deref(),
        Some("public.test_precondition_a_b")
    );
    assert_eq!(resolved(&db, "test_case_a_b", HookKind::Teardown), None);
}

#[test]
fn siblings_share_broader_hook() {
    let db = fresh_db();
    register_noop(&db, "test_teardown_billing");
    register_noop(&db, "test_teardown_billing_refund");

    assert_eq!(
        resolved(&db, "test_case_billing_invoice", HookKind::Teardown).as_deref(),
        Some("public.test_teardown_billing")
    );
    assert_eq!(
        resolved(&db, "test_case_billing_refund_partial", HookKind::Teardown).as_deref(),
        Some("public.test_teardown_billing_refund")
    );
}

#[test]
fn resolution_is_stable_while_catalog_unchanged() {
    let db = fresh_db();
    register_noop(&db, "test_setup_x");
    let first = resolved(&db, "test_case_x_y", HookKind::Setup);
    let second = resolved(&db, "test_case_x_y", HookKind::Setup);
    assert_eq!(first, second);

    register_noop(&db, "test_setup_x_y");
    assert_eq!(
        resolved(&db, "test_case_x_y", HookKind::Setup).as_deref(),
        Some("public.test_setup_x_y")
    );
}

#[test]
fn configured_conventions_drive_resolution() {
    let db = fresh_db();
    let mut config = DbunitConfig::default();
    config.conventions = Conventions {
        delimiter: "__".to_string(),
        test_case: "t".to_string(),
        setup: "before".to_string(),
        ..Conventions::default()
    };
    db.set_config(config).unwrap();
    register_noop(&db, "before__orders");

    assert_eq!(
        resolved(&db, "t__orders__open", HookKind::Setup).as_deref(),
        Some("public.before__orders")
    );
}

#[test]
fn explicit_prefix_count_and_marker() {
    let db = fresh_db();
    register_noop(&db, "verify_a");
    let hook = resolve(db.catalog(), &unit("spec_check_a_b"), 2, "verify", "_");
    assert_eq!(hook.unwrap().name().name, "verify_a");
    assert!(resolve(db.catalog(), &unit("spec_check"), 2, "verify", "_").is_none());
}
