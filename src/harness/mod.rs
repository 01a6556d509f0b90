//! Verification harness
//!
//! Runs a list of checks against one host and collects a [`Report`].
//!
//! # Execution model
//!
//! - The host is pinged once up front; an unreachable host fails the run.
//! - A failing or panicking check is recorded and the remaining checks
//!   still run.
//! - A connection error raised by a check mid-run stops the run, since every
//!   later check would fail the same way.
//! - With more than one job, checks are pulled from a shared queue by
//!   scoped worker threads. Results are stored by registration index, so the
//!   report order never depends on completion order.

mod registry;

pub use registry::{default_checks, Selection};

use chrono::Utc;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::check::{Check, CheckFailure};
use crate::error::{HarnessError, HostError};
use crate::host::Host;
use crate::report::{CheckResult, Outcome, Report};

pub struct Harness<'h> {
    host: &'h dyn Host,
    checks: Vec<Box<dyn Check>>,
    jobs: usize,
}

impl<'h> Harness<'h> {
    pub fn new(host: &'h dyn Host, checks: Vec<Box<dyn Check>>) -> Self {
        Self {
            host,
            checks,
            jobs: 1,
        }
    }

    /// Number of worker threads; values below 1 are treated as 1
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Run every check and build the report
    pub fn run(&self) -> Result<Report, HarnessError> {
        let started_at = Utc::now();
        let target = self.host.describe();
        info!(%target, checks = self.checks.len(), jobs = self.jobs, "starting verification");

        self.host.ping().map_err(HarnessError::Unreachable)?;

        let results = if self.jobs == 1 || self.checks.len() <= 1 {
            self.run_sequential()?
        } else {
            self.run_parallel()?
        };

        let report = Report::new(target, started_at, results);
        info!(
            passed = report.passed_count(),
            failed = report.failed_count(),
            "verification finished"
        );
        Ok(report)
    }

    fn run_sequential(&self) -> Result<Vec<CheckResult>, HarnessError> {
        self.checks
            .iter()
            .map(|check| run_check(check.as_ref(), self.host).map_err(HarnessError::Unreachable))
            .collect()
    }

    fn run_parallel(&self) -> Result<Vec<CheckResult>, HarnessError> {
        let next = &AtomicUsize::new(0);
        let abort = &AtomicBool::new(false);
        let workers = self.jobs.min(self.checks.len());

        let joined: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    scope.spawn(move || {
                        let mut done = Vec::new();
                        while !abort.load(Ordering::Relaxed) {
                            let index = next.fetch_add(1, Ordering::Relaxed);
                            let Some(check) = self.checks.get(index) else {
                                break;
                            };
                            match run_check(check.as_ref(), self.host) {
                                Ok(result) => done.push((index, result)),
                                Err(err) => {
                                    abort.store(true, Ordering::Relaxed);
                                    return Err(err);
                                }
                            }
                        }
                        Ok(done)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join()).collect()
        });

        let mut slots: Vec<Option<CheckResult>> = vec![None; self.checks.len()];
        for worker in joined {
            let finished = worker.map_err(|_| HarnessError::WorkerLost)?;
            for (index, result) in finished.map_err(HarnessError::Unreachable)? {
                slots[index] = Some(result);
            }
        }
        slots
            .into_iter()
            .map(|slot| slot.ok_or(HarnessError::WorkerLost))
            .collect()
    }
}

/// Run one check, turning failures and panics into a result.
///
/// Only a connection error escapes as `Err`.
fn run_check(check: &dyn Check, host: &dyn Host) -> Result<CheckResult, HostError> {
    let name = check.name();
    let start = Instant::now();

    let result = catch_unwind(AssertUnwindSafe(|| check.run(host)))
        .unwrap_or_else(|payload| Err(CheckFailure::Panicked(panic_message(payload.as_ref()))));
    let result = match result {
        Err(failure) => match failure.into_connection_error() {
            Ok(connection) => return Err(connection),
            Err(failure) => Err(failure),
        },
        passed => passed,
    };

    let outcome = Outcome::from(result);
    match &outcome {
        Outcome::Passed => debug!(check = name, "passed"),
        Outcome::Failed { detail, .. } => warn!(check = name, %detail, "failed"),
    }

    Ok(CheckResult {
        name: name.to_string(),
        description: check.description(),
        outcome,
        duration: start.elapsed(),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
