//! Testing Framework
//!
//! Step library, output contract, parsers and result reporting.

pub mod assertions;
pub mod markers;
pub mod parse;
pub mod report;
pub mod reporter;
pub mod steps;

// Re-export main types
pub use assertions::{ensure, expect_rejected, expect_step, with_result, ScenarioError, ScenarioResult};
pub use parse::PartitionOffset;
pub use report::{FailureRecord, ResultAggregator, RunReport, Verdict, VerdictKind};
pub use reporter::{OutputStyle, Reporter};
pub use steps::{ConsumeRequest, GroupDescription, KafkaCli, ResetRequest, ResetTarget, Step, TopicDescription};
