//! Suite execution
//!
//! A suite run discovers every unit whose name starts with the test-case
//! marker (optionally narrowed by a suite name) and drives each through its
//! lifecycle:
//!
//! ```text
//! Discovered → SetupDone → (PreconditionChecked → BodyExecuted →
//! PostconditionChecked) → Classified → TornDown
//! ```
//!
//! The parenthesized phases form one isolated statement whose duration is
//! measured. Each record is yielded as soon as the unit is classified; the
//! unit's teardown runs when the iterator is advanced again (or dropped),
//! before the next unit starts.
//!
//! A failing setup or teardown is yielded as `Err` and ends the run.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use dbunit_core::{Conventions, EngineResult, HookKind, Outcome, TestResult};
use dbunit_engine::{Database, RoutineHandle, Session};

use crate::isolation::{run_isolated, FailureEnvelope, Statement};
use crate::reporter::{SuiteSummary, TestReporter};
use crate::resolver::resolve_hook;

/// Run every discovered unit
pub fn run_all(session: &mut Session) -> SuiteRun<'_> {
    SuiteRun::new(session, None)
}

/// Run the units of one suite
///
/// `suite` narrows discovery to units named `test_case_<suite>...`.
pub fn run_suite<'s>(session: &'s mut Session, suite: &str) -> SuiteRun<'s> {
    SuiteRun::new(session, Some(suite))
}

/// Run with an optional suite filter
pub fn run<'s>(session: &'s mut Session, suite: Option<&str>) -> SuiteRun<'s> {
    SuiteRun::new(session, suite)
}

/// Lazy, ordered stream of result records
///
/// Yields `Ok(TestResult)` once per unit in qualified-name order, or a single
/// `Err` for a setup or teardown failure, after which it is exhausted.
pub struct SuiteRun<'s> {
    session: &'s mut Session,
    db: Arc<Database>,
    conventions: Conventions,
    units: std::vec::IntoIter<RoutineHandle>,
    unit_count: usize,
    /// Teardown of the unit whose record was yielded last
    pending_teardown: Option<RoutineHandle>,
    finished: bool,
}

impl<'s> SuiteRun<'s> {
    fn new(session: &'s mut Session, suite: Option<&str>) -> Self {
        let db = Arc::clone(session.database());
        let conventions = db.config().conventions;
        let mut prefix = conventions.unit_prefix();
        if let Some(suite) = suite {
            prefix.push_str(suite);
        }
        let units = db.catalog().list_routines(&prefix);
        info!(target: "dbunit::suite", %prefix, units = units.len(), "Units discovered");

        Self {
            session,
            db,
            conventions,
            unit_count: units.len(),
            units: units.into_iter(),
            pending_teardown: None,
            finished: false,
        }
    }

    /// Number of units discovered for this run
    pub fn unit_count(&self) -> usize {
        self.unit_count
    }

    /// Run to completion, stopping at the first setup or teardown failure
    pub fn collect_results(self) -> EngineResult<Vec<TestResult>> {
        self.collect()
    }

    /// Run to completion through a reporter and return the summary
    ///
    /// # Errors
    ///
    /// Returns the first setup or teardown failure; the reporter has then
    /// seen every record produced before it.
    pub fn report(mut self, reporter: &mut dyn TestReporter) -> EngineResult<SuiteSummary> {
        reporter.on_run_start(self.unit_count);
        let started = Instant::now();
        let mut summary = SuiteSummary::default();
        for item in &mut self {
            let result = item?;
            summary.record(&result);
            reporter.on_test_complete(&result);
        }
        summary.elapsed = started.elapsed();
        reporter.on_run_complete(&summary);
        Ok(summary)
    }

    fn resolve(&self, unit: &RoutineHandle, kind: HookKind) -> Option<RoutineHandle> {
        let hook = resolve_hook(self.db.catalog(), &self.conventions, unit.name(), kind);
        if let Some(hook) = &hook {
            debug!(target: "dbunit::suite", unit = %unit.name(), %kind, hook = %hook.name(), "Hook resolved");
        }
        hook
    }

    fn run_unit(&mut self, unit: RoutineHandle) -> EngineResult<TestResult> {
        let setup = self.resolve(&unit, HookKind::Setup);
        let precondition = self.resolve(&unit, HookKind::Precondition);
        let postcondition = self.resolve(&unit, HookKind::Postcondition);
        let teardown = self.resolve(&unit, HookKind::Teardown);

        if let Some(setup) = setup {
            run_isolated(self.session, &Statement::new().call(setup))
                .map_err(FailureEnvelope::into_error)?;
            debug!(target: "dbunit::suite", unit = %unit.name(), "Setup done");
        }
        self.pending_teardown = teardown;

        let mut statement = Statement::new();
        if let Some(hook) = precondition {
            statement = statement.check(HookKind::Precondition, hook);
        }
        statement = statement.call(unit.clone());
        if let Some(hook) = postcondition {
            statement = statement.check(HookKind::Postcondition, hook);
        }

        let started = Instant::now();
        let outcome = run_isolated(self.session, &statement);
        let duration = started.elapsed();

        let result = classify(&unit, outcome, duration);
        info!(
            target: "dbunit::suite",
            unit = %result.name,
            outcome = %result.outcome,
            duration_us = result.duration.as_micros() as u64,
            "Unit finished"
        );
        Ok(result)
    }

    fn run_pending_teardown(&mut self) -> EngineResult<()> {
        match self.pending_teardown.take() {
            Some(teardown) => {
                run_isolated(self.session, &Statement::new().call(teardown))
                    .map_err(FailureEnvelope::into_error)?;
                debug!(target: "dbunit::suite", "Teardown done");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Iterator for SuiteRun<'_> {
    type Item = EngineResult<TestResult>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Err(e) = self.run_pending_teardown() {
            self.finished = true;
            return Some(Err(e));
        }
        let Some(unit) = self.units.next() else {
            self.finished = true;
            return None;
        };
        let item = self.run_unit(unit);
        if item.is_err() {
            self.finished = true;
        }
        Some(item)
    }
}

impl Drop for SuiteRun<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.run_pending_teardown() {
            warn!(target: "dbunit::suite", error = %e, "Teardown failed after the run was abandoned");
        }
    }
}

/// Map the measured phase's result to a record
fn classify(
    unit: &RoutineHandle,
    outcome: Result<(), FailureEnvelope>,
    duration: Duration,
) -> TestResult {
    let (outcome, message) = match outcome {
        Ok(()) => (Outcome::Success, "OK".to_string()),
        Err(envelope) if envelope.is_assertion_failure() => (Outcome::Failed, envelope.to_string()),
        Err(envelope) => (Outcome::Erroneous, envelope.to_string()),
    };
    TestResult {
        name: unit.name().clone(),
        outcome,
        message,
        duration,
    }
}
