//! Reporting of suite runs
//!
//! [`SuiteRun::report`](crate::SuiteRun::report) feeds every record to a
//! [`TestReporter`]. Two reporters are provided: [`LogReporter`] emits through
//! `tracing`, [`JsonLinesReporter`] writes one JSON object per line.

use std::io::{self, Write};
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use dbunit_core::{Outcome, TestResult};

/// Callbacks invoked while a suite run is reported
pub trait TestReporter {
    /// Called once discovery is complete
    fn on_run_start(&mut self, _unit_count: usize) {}

    /// Called for every record, in order
    fn on_test_complete(&mut self, result: &TestResult);

    /// Called when every unit has run
    fn on_run_complete(&mut self, summary: &SuiteSummary);
}

/// Totals for a suite run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SuiteSummary {
    /// Units executed
    pub total: usize,
    /// Units classified as success
    pub succeeded: usize,
    /// Units classified as failed
    pub failed: usize,
    /// Units classified as erroneous
    pub erroneous: usize,
    /// Wall time of the whole run, hooks included
    pub elapsed: Duration,
}

impl SuiteSummary {
    /// Add one record to the totals
    pub fn record(&mut self, result: &TestResult) {
        self.total += 1;
        match result.outcome {
            Outcome::Success => self.succeeded += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Erroneous => self.erroneous += 1,
        }
    }

    /// Check if every unit succeeded
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.erroneous == 0
    }
}

/// Reporter emitting through `tracing` (target `dbunit::report`)
#[derive(Debug, Default)]
pub struct LogReporter;

impl TestReporter for LogReporter {
    fn on_run_start(&mut self, unit_count: usize) {
        info!(target: "dbunit::report", unit_count, "Suite run started");
    }

    fn on_test_complete(&mut self, result: &TestResult) {
        if result.is_success() {
            info!(target: "dbunit::report", "{}", result);
        } else {
            warn!(target: "dbunit::report", "{}", result);
        }
    }

    fn on_run_complete(&mut self, summary: &SuiteSummary) {
        info!(
            target: "dbunit::report",
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            erroneous = summary.erroneous,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Suite run complete"
        );
    }
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum JsonEvent<'a> {
    Test {
        name: String,
        outcome: Outcome,
        message: &'a str,
        duration_ms: f64,
    },
    Summary {
        total: usize,
        succeeded: usize,
        failed: usize,
        erroneous: usize,
        elapsed_ms: f64,
    },
}

/// Reporter writing one JSON object per record, then one for the summary
///
/// ```text
/// {"event":"test","name":"public.test_case_a","outcome":"failed","message":"...","duration_ms":0.12}
/// {"event":"summary","total":1,"succeeded":0,"failed":1,"erroneous":0,"elapsed_ms":0.3}
/// ```
///
/// Write errors do not interrupt the run; the first one is returned by
/// [`JsonLinesReporter::finish`].
pub struct JsonLinesReporter<W: Write> {
    writer: W,
    error: Option<io::Error>,
}

impl<W: Write> JsonLinesReporter<W> {
    /// Report into `writer`
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
        }
    }

    /// Flush and return the writer, or the first write error
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn emit(&mut self, event: &JsonEvent<'_>) {
        if self.error.is_some() {
            return;
        }
        let written = serde_json::to_writer(&mut self.writer, event)
            .map_err(io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"));
        if let Err(e) = written {
            self.error = Some(e);
        }
    }
}

impl<W: Write> TestReporter for JsonLinesReporter<W> {
    fn on_test_complete(&mut self, result: &TestResult) {
        self.emit(&JsonEvent::Test {
            name: result.name.to_string(),
            outcome: result.outcome,
            message: &result.message,
            duration_ms: result.duration.as_secs_f64() * 1000.0,
        });
    }

    fn on_run_complete(&mut self, summary: &SuiteSummary) {
        self.emit(&JsonEvent::Summary {
            total: summary.total,
            succeeded: summary.succeeded,
            failed: summary.failed,
            erroneous: summary.erroneous,
            elapsed_ms: summary.elapsed.as_secs_f64() * 1000.0,
        });
    }
}
