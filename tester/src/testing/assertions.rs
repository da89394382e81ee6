//! Scenario assertion helpers
//!
//! Scenario bodies return [`ScenarioResult`]. An expectation that does not
//! hold is a [`ScenarioError::Failed`]; anything that stops the harness from
//! observing the CLI at all is a [`ScenarioError::Fault`].

use shared::HarnessError;
use thiserror::Error;

use super::steps::Step;
use crate::runtime::CommandResult;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Fault(#[from] HarnessError),
}

pub type ScenarioResult = Result<(), ScenarioError>;

/// Fail with `reason` unless `condition` holds
pub fn ensure(condition: bool, reason: impl Into<String>) -> Result<(), ScenarioError> {
    if condition {
        Ok(())
    } else {
        Err(ScenarioError::Failed(reason.into()))
    }
}

/// Fail unless the step's check passed; the reason carries the exit code and
/// the first stderr line
pub fn expect_step(step: &Step, reason: &str) -> Result<(), ScenarioError> {
    ensure(step.passed(), with_result(reason, &step.result))
}

/// Fail unless the call exited non-zero with `marker` somewhere in its output
pub fn expect_rejected(result: &CommandResult, marker: &str, reason: &str) -> Result<(), ScenarioError> {
    ensure(
        !result.success() && result.output_contains_ignore_case(marker),
        with_result(reason, result),
    )
}

pub fn with_result(reason: &str, result: &CommandResult) -> String {
    format!("{} ({})", reason, result.brief())
}
