//! Result aggregation across one suite run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use shared::{HarnessResult, RunId};

/// Outcome of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    /// An expectation about the CLI's behavior did not hold
    Fail(String),
    /// The harness itself broke while running the scenario
    Error(String),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Verdict::Pass => None,
            Verdict::Fail(reason) | Verdict::Error(reason) => Some(reason),
        }
    }

    pub fn kind(&self) -> VerdictKind {
        match self {
            Verdict::Pass => VerdictKind::Pass,
            Verdict::Fail(_) => VerdictKind::Fail,
            Verdict::Error(_) => VerdictKind::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictKind {
    Pass,
    Fail,
    Error,
}

impl fmt::Display for VerdictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VerdictKind::Pass => "PASS",
            VerdictKind::Fail => "FAIL",
            VerdictKind::Error => "ERROR",
        };
        f.write_str(label)
    }
}

/// One non-passing scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub group: String,
    pub scenario: String,
    pub kind: VerdictKind,
    pub reason: String,
}

/// Final, immutable summary of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub failures: Vec<FailureRecord>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errored
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    /// 0 when every scenario passed (including an empty run), 1 otherwise
    pub fn exit_status(&self) -> i32 {
        if self.all_passed() { 0 } else { 1 }
    }

    pub fn write_json(&self, path: &Path) -> HarnessResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Collects verdicts as scenarios finish
#[derive(Debug)]
pub struct ResultAggregator {
    run_id: RunId,
    started_at: DateTime<Utc>,
    passed: usize,
    failed: usize,
    errored: usize,
    failures: Vec<FailureRecord>,
}

impl ResultAggregator {
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            passed: 0,
            failed: 0,
            errored: 0,
            failures: Vec::new(),
        }
    }

    pub fn record(&mut self, group: &str, scenario: &str, verdict: &Verdict) {
        match verdict {
            Verdict::Pass => self.passed += 1,
            Verdict::Fail(_) => self.failed += 1,
            Verdict::Error(_) => self.errored += 1,
        }

        if let Some(reason) = verdict.reason() {
            self.failures.push(FailureRecord {
                group: group.to_string(),
                scenario: scenario.to_string(),
                kind: verdict.kind(),
                reason: reason.to_string(),
            });
        }
    }

    pub fn recorded(&self) -> usize {
        self.passed + self.failed + self.errored
    }

    pub fn exit_status(&self) -> i32 {
        if self.failed == 0 && self.errored == 0 { 0 } else { 1 }
    }

    pub fn summarize(&self) -> RunReport {
        RunReport {
            run_id: self.run_id.clone(),
            started_at: self.started_at,
            finished_at: Utc::now(),
            passed: self.passed,
            failed: self.failed,
            errored: self.errored,
            failures: self.failures.clone(),
        }
    }
}
