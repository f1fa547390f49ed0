//! Outcome classification of the measured phase

use std::sync::Arc;

use crate::common::*;
use dbunit::assertions::{assert_equals, assert_true, fail};
use dbunit::{
    run_all, run_suite, terminate_sessions, Database, EngineError, ErrorCode, Outcome, Session,
    TestResult, Value,
};

fn run_single(db: &Arc<Database>) -> TestResult {
    let mut session = db.connect();
    let mut results = run_all(&mut session).collect_results().unwrap();
    assert_eq!(results.len(), 1);
    results.remove(0)
}

#[test]
fn passing_unit_is_success() {
    let db = fresh_db();
    db.register_routine("test_case_ok", |s: &mut Session| {
        s.insert("t", "1", 1)?;
        assert_equals(1, s.count("t")? as i64)?;
        Ok(Value::Null)
    })
    .unwrap();

    let result = run_single(&db);
    assert_eq!(result.outcome, Outcome::Success);
    assert_eq!(result.message, "OK");
}

#[test]
fn assertion_violation_is_failed() {
    let db = fresh_db();
    db.register_routine("test_case_math", |_: &mut Session| {
        assert_equals(1, 2)?;
        Ok(Value::Null)
    })
    .unwrap();

    let result = run_single(&db);
    assert_eq!(result.outcome, Outcome::Failed);
    assert!(result.message.contains("Assertion failure"));
    assert!(result.message.starts_with("SELECT public.test_case_math() failed"));
    assert!(result.duration > std::time::Duration::ZERO);
}

#[test]
fn explicit_fail_is_failed() {
    let db = fresh_db();
    db.register_routine("test_case_todo", |_: &mut Session| fail("not written yet"))
        .unwrap();
    assert_eq!(run_single(&db).outcome, Outcome::Failed);
}

#[test]
fn missing_routine_is_erroneous() {
    let db = fresh_db();
    db.register_routine("test_case_calls_ghost", |s: &mut Session| {
        s.call("ghost_routine")
    })
    .unwrap();

    let result = run_single(&db);
    assert_eq!(result.outcome, Outcome::Erroneous);
    assert!(result.message.contains("ghost_routine() does not exist"));
}

#[test]
fn environment_errors_are_erroneous() {
    let db = fresh_db();
    db.register_routine("test_case_a_raise", |_: &mut Session| {
        Err(EngineError::raise("custom exception"))
    })
    .unwrap();
    db.register_routine("test_case_b_unique", |s: &mut Session| {
        s.insert("t", "1", 1)?;
        s.insert("t", "1", 2)?;
        Ok(Value::Null)
    })
    .unwrap();
    db.register_routine("test_case_c_type", |_: &mut Session| {
        assert_true(7)?;
        Ok(Value::Null)
    })
    .unwrap();
    db.register_routine("test_case_d_panic", |_: &mut Session| -> dbunit::EngineResult<Value> {
        panic!("unit exploded")
    })
    .unwrap();
    db.register_routine("test_case_e_recursion", |s: &mut Session| {
        s.call("test_case_e_recursion")
    })
    .unwrap();

    let mut session = db.connect();
    let results = run_all(&mut session).collect_results().unwrap();

    assert_eq!(results.len(), 5);
    for result in &results {
        assert_eq!(result.outcome, Outcome::Erroneous, "{}", result);
    }
    assert!(results[1].message.contains("DETAIL: Key (row)=(1) already exists."));
    assert!(results[3].message.contains("unit exploded"));
    assert!(results[4].message.contains("stack depth limit exceeded"));
}

#[test]
fn false_precondition_skips_body() {
    let db = fresh_db();
    let journal = Journal::new();
    register_recorder(&db, &journal, "test_case_orders_open", Value::Null);
    register_recorder(&db, &journal, "test_precondition_orders", Value::Bool(false));

    let result = run_single(&db);

    assert_eq!(result.outcome, Outcome::Failed);
    assert!(result
        .message
        .contains("precondition public.test_precondition_orders() returned false"));
    assert_eq!(journal.events(), vec!["test_precondition_orders"]);
}

#[test]
fn false_postcondition_is_failed_after_body() {
    let db = fresh_db();
    let journal = Journal::new();
    register_recorder(&db, &journal, "test_case_orders_open", Value::Null);
    register_recorder(&db, &journal, "test_postcondition_orders_open", Value::Bool(false));

    let result = run_single(&db);

    assert_eq!(result.outcome, Outcome::Failed);
    assert_eq!(
        journal.events(),
        vec!["test_case_orders_open", "test_postcondition_orders_open"]
    );
}

#[test]
fn null_condition_passes() {
    let db = fresh_db();
    register_noop(&db, "test_case_n");
    db.register_routine("test_precondition_n", |_: &mut Session| Ok(Value::Null))
        .unwrap();
    assert_eq!(run_single(&db).outcome, Outcome::Success);
}

#[test]
fn terminated_session_makes_remaining_units_erroneous() {
    let db = fresh_db();
    db.register_routine("test_case_a_admin", |s: &mut Session| {
        let admin = s.database().connect();
        let terminated = terminate_sessions(&admin, s.database().name())?;
        assert_equals(1, terminated.len() as i64)?;
        Ok(Value::Null)
    })
    .unwrap();
    register_noop(&db, "test_case_b_after");

    let mut session = db.connect();
    let results = run_suite(&mut session, "").collect_results().unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].outcome, Outcome::Erroneous);
    assert_eq!(results[1].outcome, Outcome::Erroneous);
    assert!(results[1].message.contains("administrator command"));
    assert!(session.is_terminated());
    assert_eq!(
        session.get("t", "1").unwrap_err().code,
        ErrorCode::AdminShutdown
    );
}
