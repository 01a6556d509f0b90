//! Check results and the aggregated run report

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::time::Duration;

use crate::check::{CheckFailure, FailureKind};

/// Exit code when every check passed
pub const EXIT_PASSED: i32 = 0;
/// Exit code when at least one check failed
pub const EXIT_FAILED: i32 = 1;
/// Exit code when the run could not complete
pub const EXIT_ERROR: i32 = 2;

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed { kind: FailureKind, detail: String },
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }
}

impl From<Result<(), CheckFailure>> for Outcome {
    fn from(result: Result<(), CheckFailure>) -> Self {
        match result {
            Ok(()) => Outcome::Passed,
            Err(failure) => Outcome::Failed {
                kind: failure.kind(),
                detail: failure.to_string(),
            },
        }
    }
}

/// Result of running a single check
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

impl CheckResult {
    pub fn passed(&self) -> bool {
        self.outcome.is_passed()
    }
}

/// All check results of one run, in registration order
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub passed: bool,
    pub results: Vec<CheckResult>,
}

impl Report {
    pub fn new(target: impl Into<String>, started_at: DateTime<Utc>, results: Vec<CheckResult>) -> Self {
        let passed = results.iter().all(CheckResult::passed);
        Self {
            target: target.into(),
            started_at,
            passed,
            results,
        }
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.passed_count()
    }

    pub fn total_duration(&self) -> Duration {
        self.results.iter().map(|r| r.duration).sum()
    }

    /// Process exit code for this report
    pub fn exit_code(&self) -> i32 {
        if self.passed {
            EXIT_PASSED
        } else {
            EXIT_FAILED
        }
    }

    /// Check names and outcomes, ignoring timing
    pub fn outcomes(&self) -> Vec<(&str, &Outcome)> {
        self.results
            .iter()
            .map(|r| (r.name.as_str(), &r.outcome))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable report, one line per check plus a summary
    pub fn render_text(&self) -> String {
        let mut out = format!("{} {}\n\n", "Verifying".bold(), self.target);

        for result in &self.results {
            match &result.outcome {
                Outcome::Passed => {
                    out.push_str(&format!(
                        "  {} {} {}\n",
                        "✓".green().bold(),
                        result.name,
                        format!("({}ms)", result.duration.as_millis()).dimmed()
                    ));
                }
                Outcome::Failed { detail, .. } => {
                    out.push_str(&format!(
                        "  {} {} {}\n",
                        "✗".red().bold(),
                        result.name,
                        format!("({}ms)", result.duration.as_millis()).dimmed()
                    ));
                    out.push_str(&format!("      {}\n", result.description.dimmed()));
                    for line in detail.lines() {
                        out.push_str(&format!("      {}\n", line.red()));
                    }
                }
            }
        }

        out.push('\n');
        let summary = format!(
            "{} passed, {} failed ({}ms)",
            self.passed_count(),
            self.failed_count(),
            self.total_duration().as_millis()
        );
        if self.passed {
            out.push_str(&format!("{} {}\n", "✓".green().bold(), summary));
        } else {
            out.push_str(&format!("{} {}\n", "✗".red().bold(), summary));
        }
        out
    }
}
