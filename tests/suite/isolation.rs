//! Effects of units across isolation boundaries

use std::thread;

use crate::common::*;
use dbunit::assertions::{assert_equals, fail};
use dbunit::{run_all, run_suite, Outcome, Session, Value};

#[test]
fn unit_effects_survive_caller_rollback() {
    let db = fresh_db();
    db.register_routine("test_case_writes", |s: &mut Session| {
        s.put("audit", "unit", "ran")?;
        Ok(Value::Null)
    })
    .unwrap();

    let mut session = db.connect();
    session.begin().unwrap();
    session.put("audit", "caller", "pending").unwrap();

    let results = run_all(&mut session).collect_results().unwrap();
    assert_eq!(results[0].outcome, Outcome::Success);
    assert!(session.in_transaction());
    session.rollback().unwrap();

    assert_eq!(
        session.get("audit", "unit").unwrap(),
        Some(Value::from("ran"))
    );
    assert_eq!(session.get("audit", "caller").unwrap(), None);
}

#[test]
fn failed_unit_leaves_no_partial_effects() {
    let db = fresh_db();
    db.register_routine("test_case_half_done", |s: &mut Session| {
        s.put("orders", "1", 10)?;
        s.put("orders", "2", 20)?;
        fail("stop halfway")
    })
    .unwrap();

    let mut session = db.connect();
    let results = run_all(&mut session).collect_results().unwrap();

    assert_eq!(results[0].outcome, Outcome::Failed);
    assert_eq!(session.count("orders").unwrap(), 0);
    assert!(!session.in_transaction());
}

#[test]
fn postcondition_and_teardown_see_body_writes() {
    let db = fresh_db();
    let journal = Journal::new();
    db.register_routine("test_setup_stock", |s: &mut Session| {
        s.put("stock", "widget", 3)?;
        Ok(Value::Null)
    })
    .unwrap();
    db.register_routine("test_case_stock_sell", |s: &mut Session| {
        assert_equals(3, s.get("stock", "widget")?)?;
        s.put("stock", "widget", 2)?;
        Ok(Value::Null)
    })
    .unwrap();
    db.register_routine("test_postcondition_stock", |s: &mut Session| {
        Ok(Value::Bool(s.get("stock", "widget")? == Some(Value::Int(2))))
    })
    .unwrap();
    let seen = journal.clone();
    db.register_routine("test_teardown_stock", move |s: &mut Session| {
        let level = s.get("stock", "widget")?;
        seen.push(format!("teardown saw {:?}", level));
        s.delete("stock", "widget")?;
        Ok(Value::Null)
    })
    .unwrap();

    let mut session = db.connect();
    let results = run_all(&mut session).collect_results().unwrap();

    assert_eq!(results[0].outcome, Outcome::Success, "{}", results[0]);
    assert_eq!(journal.events(), vec!["teardown saw Some(Int(2))"]);
    assert_eq!(db.row_count(), 0);
}

#[test]
fn setup_effects_remain_when_body_fails() {
    let db = fresh_db();
    db.register_routine("test_setup_fixture", |s: &mut Session| {
        s.put("fixture", "loaded", true)?;
        Ok(Value::Null)
    })
    .unwrap();
    db.register_routine("test_case_fixture_broken", |s: &mut Session| {
        s.delete("fixture", "loaded")?;
        fail("broken")
    })
    .unwrap();

    let mut session = db.connect();
    let results = run_all(&mut session).collect_results().unwrap();

    assert_eq!(results[0].outcome, Outcome::Failed);
    assert_eq!(
        session.get("fixture", "loaded").unwrap(),
        Some(Value::Bool(true))
    );
}

#[test]
fn concurrent_suites_on_separate_sessions() {
    let db = fresh_db();
    for suite in ["alpha", "beta"] {
        for n in 0..5 {
            let table = suite.to_string();
            let row = n.to_string();
            db.register_routine(
                &format!("test_case_{}_{}", suite, n),
                move |s: &mut Session| {
                    s.insert(&table, &row, n)?;
                    assert_equals(Value::Int(n), s.get(&table, &row)?)?;
                    Ok(Value::Null)
                },
            )
            .unwrap();
        }
    }

    thread::scope(|scope| {
        let handles: Vec<_> = ["alpha", "beta"]
            .into_iter()
            .map(|suite| {
                let db = &db;
                scope.spawn(move || {
                    let mut session = db.connect();
                    run_suite(&mut session, suite).collect_results().unwrap()
                })
            })
            .collect();
        for handle in handles {
            let results = handle.join().unwrap();
            assert_eq!(results.len(), 5);
            assert!(results.iter().all(|r| r.is_success()), "{:?}", results);
        }
    });

    let mut session = db.connect();
    assert_eq!(session.count("alpha").unwrap(), 5);
    assert_eq!(session.count("beta").unwrap(), 5);
}

#[test]
fn unit_rewrite_of_caller_pending_value_survives_rollback() {
    let db = fresh_db();
    db.register_routine("test_case_finish_job", |s: &mut Session| {
        s.put("status", "job", "done")?;
        Ok(Value::Null)
    })
    .unwrap();

    let mut session = db.connect();
    session.begin().unwrap();
    session.put("status", "job", "done").unwrap();

    let results = run_all(&mut session).collect_results().unwrap();
    assert_eq!(results[0].outcome, Outcome::Success);
    session.rollback().unwrap();

    assert_eq!(
        session.get("status", "job").unwrap(),
        Some(Value::from("done"))
    );
}

#[test]
fn unit_delete_of_caller_pending_delete_survives_rollback() {
    let db = fresh_db();
    db.register_routine("test_case_purge_job", |s: &mut Session| {
        s.delete("status", "job")?;
        Ok(Value::Null)
    })
    .unwrap();

    let mut session = db.connect();
    session.put("status", "job", "queued").unwrap();
    session.begin().unwrap();
    assert!(session.delete("status", "job").unwrap());

    let results = run_all(&mut session).collect_results().unwrap();
    assert_eq!(results[0].outcome, Outcome::Success);
    session.rollback().unwrap();

    assert_eq!(session.get("status", "job").unwrap(), None);
    assert_eq!(db.row_count(), 0);
}
