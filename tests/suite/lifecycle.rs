//! Unit lifecycle: ordering, hooks and interrupted runs

use crate::common::*;
use dbunit::assertions::fail;
use dbunit::{run, run_all, run_suite, ErrorCode, Outcome, Session, Value};

fn register_failing(db: &dbunit::Database, journal: &Journal, name: &str) {
    let journal = journal.clone();
    let event = name.to_string();
    db.register_routine(name, move |_: &mut Session| {
        journal.push(event.clone());
        fail("deliberate")
    })
    .unwrap();
}

#[test]
fn units_run_in_order_each_followed_by_its_teardown() {
    let db = fresh_db();
    let journal = Journal::new();
    register_recorder(&db, &journal, "test_setup_b", Value::Null);
    register_recorder(&db, &journal, "test_case_b_y", Value::Null);
    register_recorder(&db, &journal, "test_teardown_b", Value::Null);
    register_failing(&db, &journal, "test_case_a_x");
    register_recorder(&db, &journal, "test_teardown_a", Value::Null);

    let mut session = db.connect();
    let results = run_all(&mut session).collect_results().unwrap();

    let names: Vec<String> = results.iter().map(|r| r.name.to_string()).collect();
    assert_eq!(names, vec!["public.test_case_a_x", "public.test_case_b_y"]);
    assert_eq!(results[0].outcome, Outcome::Failed);
    assert_eq!(results[1].outcome, Outcome::Success);
    assert_eq!(
        journal.events(),
        vec![
            "test_case_a_x",
            "test_teardown_a",
            "test_setup_b",
            "test_case_b_y",
            "test_teardown_b",
        ]
    );
}

#[test]
fn units_are_ordered_across_schemas() {
    let db = fresh_db();
    register_noop(&db, "public.test_case_a");
    register_noop(&db, "billing.test_case_z");

    let mut session = db.connect();
    let names: Vec<String> = run_all(&mut session)
        .map(|r| r.unwrap().name.to_string())
        .collect();

    assert_eq!(names, vec!["billing.test_case_z", "public.test_case_a"]);
}

#[test]
fn teardown_runs_after_record_is_yielded() {
    let db = fresh_db();
    let journal = Journal::new();
    register_recorder(&db, &journal, "test_case_x_a", Value::Null);
    register_recorder(&db, &journal, "test_case_x_b", Value::Null);
    register_recorder(&db, &journal, "test_teardown_x", Value::Null);

    let mut session = db.connect();
    let mut suite_run = run_all(&mut session);
    assert_eq!(suite_run.unit_count(), 2);

    let first = suite_run.next().unwrap().unwrap();
    assert_eq!(first.name.name, "test_case_x_a");
    assert_eq!(journal.events(), vec!["test_case_x_a"]);

    suite_run.next().unwrap().unwrap();
    assert_eq!(
        journal.events(),
        vec!["test_case_x_a", "test_teardown_x", "test_case_x_b"]
    );

    assert!(suite_run.next().is_none());
    assert!(suite_run.next().is_none());
    assert_eq!(journal.events().len(), 4);
}

#[test]
fn dropping_run_early_still_tears_down() {
    let db = fresh_db();
    let journal = Journal::new();
    register_recorder(&db, &journal, "test_case_x_a", Value::Null);
    register_recorder(&db, &journal, "test_case_x_b", Value::Null);
    register_recorder(&db, &journal, "test_teardown_x", Value::Null);

    let mut session = db.connect();
    {
        let mut suite_run = run_all(&mut session);
        suite_run.next().unwrap().unwrap();
    }

    assert_eq!(journal.events(), vec!["test_case_x_a", "test_teardown_x"]);
}

#[test]
fn setup_failure_ends_run_without_teardown() {
    let db = fresh_db();
    let journal = Journal::new();
    register_failing(&db, &journal, "test_setup_a");
    register_recorder(&db, &journal, "test_case_a", Value::Null);
    register_recorder(&db, &journal, "test_case_b", Value::Null);
    register_recorder(&db, &journal, "test_teardown_a", Value::Null);

    let mut session = db.connect();
    let mut suite_run = run_all(&mut session);

    let err = suite_run.next().unwrap().unwrap_err();
    assert_eq!(err.code, ErrorCode::AssertionFailure);
    assert!(err.message.starts_with("SELECT public.test_setup_a() failed"));
    assert!(suite_run.next().is_none());
    drop(suite_run);

    assert_eq!(journal.events(), vec!["test_setup_a"]);
}

#[test]
fn teardown_failure_ends_run() {
    let db = fresh_db();
    let journal = Journal::new();
    register_recorder(&db, &journal, "test_case_a", Value::Null);
    register_recorder(&db, &journal, "test_case_b", Value::Null);
    db.register_routine("test_teardown_a", |_: &mut Session| {
        Err(dbunit::EngineError::division_by_zero())
    })
    .unwrap();

    let mut session = db.connect();
    let mut suite_run = run_all(&mut session);

    assert!(suite_run.next().unwrap().unwrap().is_success());
    let err = suite_run.next().unwrap().unwrap_err();
    assert_eq!(err.code, ErrorCode::DivisionByZero);
    assert!(suite_run.next().is_none());
    drop(suite_run);

    assert_eq!(journal.events(), vec!["test_case_a"]);
    assert!(run_all(&mut session).collect_results().is_err());
}

#[test]
fn suite_name_narrows_discovery() {
    let db = fresh_db();
    register_noop(&db, "test_case_billing_refund");
    register_noop(&db, "test_case_billing_charge");
    register_noop(&db, "test_case_shipping_label");

    let mut session = db.connect();
    let billing = run_suite(&mut session, "billing").collect_results().unwrap();
    assert_eq!(billing.len(), 2);
    assert!(billing.iter().all(|r| r.name.name.starts_with("test_case_billing")));

    assert_eq!(run(&mut session, Some("shipping")).unit_count(), 1);
    assert_eq!(run(&mut session, None).unit_count(), 3);
    assert_eq!(run_suite(&mut session, "missing").unit_count(), 0);
}

#[test]
fn hooks_are_resolved_when_each_unit_starts() {
    let db = fresh_db();
    let journal = Journal::new();
    let registering = journal.clone();
    db.register_routine("test_case_a", move |s: &mut Session| {
        let journal = registering.clone();
        s.database()
            .register_routine("test_setup_b", move |_: &mut Session| {
                journal.push("late setup");
                Ok(Value::Null)
            })?;
        Ok(Value::Null)
    })
    .unwrap();
    register_recorder(&db, &journal, "test_case_b", Value::Null);

    let mut session = db.connect();
    let results = run_all(&mut session).collect_results().unwrap();

    assert!(results.iter().all(|r| r.is_success()));
    assert_eq!(journal.events(), vec!["late setup", "test_case_b"]);
}

#[test]
fn empty_catalog_yields_nothing() {
    let db = fresh_db();
    register_noop(&db, "helper");
    let mut session = db.connect();
    assert!(run_all(&mut session).collect_results().unwrap().is_empty());
}
