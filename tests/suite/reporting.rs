//! Reporters driven by a full suite run

use crate::common::*;
use dbunit::assertions::fail;
use dbunit::{
    run_all, EngineError, JsonLinesReporter, LogReporter, Session, SuiteSummary, TestReporter,
    TestResult,
};

fn mixed_suite() -> std::sync::Arc<dbunit::Database> {
    let db = fresh_db();
    register_noop(&db, "test_case_a_passes");
    db.register_routine("test_case_b_fails", |_: &mut Session| fail("wrong total"))
        .unwrap();
    db.register_routine("test_case_c_errors", |_: &mut Session| {
        Err(EngineError::raise("lost connection to warehouse"))
    })
    .unwrap();
    db
}

#[derive(Default)]
struct Recording {
    started_with: Option<usize>,
    names: Vec<String>,
    summary: Option<SuiteSummary>,
}

impl TestReporter for Recording {
    fn on_run_start(&mut self, unit_count: usize) {
        self.started_with = Some(unit_count);
    }

    fn on_test_complete(&mut self, result: &TestResult) {
        self.names.push(result.name.name.clone());
    }

    fn on_run_complete(&mut self, summary: &SuiteSummary) {
        self.summary = Some(summary.clone());
    }
}

#[test]
fn reporter_sees_every_record_and_summary() {
    let db = mixed_suite();
    let mut session = db.connect();
    let mut reporter = Recording::default();

    let summary = run_all(&mut session).report(&mut reporter).unwrap();

    assert_eq!(reporter.started_with, Some(3));
    assert_eq!(
        reporter.names,
        vec!["test_case_a_passes", "test_case_b_fails", "test_case_c_errors"]
    );
    assert_eq!(reporter.summary.as_ref(), Some(&summary));
    assert_eq!(
        (summary.total, summary.succeeded, summary.failed, summary.erroneous),
        (3, 1, 1, 1)
    );
    assert!(!summary.is_success());
}

#[test]
fn json_lines_report() {
    let db = mixed_suite();
    let mut session = db.connect();
    let mut reporter = JsonLinesReporter::new(Vec::new());

    run_all(&mut session).report(&mut reporter).unwrap();

    let output = String::from_utf8(reporter.finish().unwrap()).unwrap();
    let events: Vec<serde_json::Value> = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(events.len(), 4);
    assert_eq!(events[0]["name"], "public.test_case_a_passes");
    assert_eq!(events[0]["outcome"], "success");
    assert_eq!(events[0]["message"], "OK");
    assert_eq!(events[1]["outcome"], "failed");
    assert_eq!(events[2]["outcome"], "erroneous");
    assert!(events[2]["message"]
        .as_str()
        .unwrap()
        .contains("lost connection to warehouse"));
    assert_eq!(events[3]["event"], "summary");
    assert_eq!(events[3]["total"], 3);
}

#[test]
fn log_reporter_summary() {
    let db = fresh_db();
    register_noop(&db, "test_case_only");
    let mut session = db.connect();

    let summary = run_all(&mut session).report(&mut LogReporter).unwrap();

    assert_eq!(summary.total, 1);
    assert!(summary.is_success());
}

#[test]
fn report_stops_at_setup_failure() {
    let db = mixed_suite();
    db.register_routine("test_setup_b", |_: &mut Session| {
        Err(EngineError::raise("fixture missing"))
    })
    .unwrap();
    let mut session = db.connect();
    let mut reporter = Recording::default();

    let err = run_all(&mut session).report(&mut reporter).unwrap_err();

    assert!(err.message.contains("fixture missing"));
    assert_eq!(reporter.names, vec!["test_case_a_passes"]);
    assert!(reporter.summary.is_none());
}
