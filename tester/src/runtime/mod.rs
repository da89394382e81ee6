//! Runtime Management
//!
//! Process invocation, background process control, resource naming and
//! cleanup during test execution.

pub mod background;
pub mod cleanup;
pub mod invoker;
pub mod names;
pub mod readiness;

// Re-export main types
pub use background::{BackgroundHandle, ProcessState};
pub use cleanup::{CleanupManager, CleanupReport, TrackedResource};
pub use invoker::{
    CliProcess, CommandInvocation, CommandResult, CommandRunner, MockCommandRunner, SENTINEL_EXIT_CODE,
};
pub use names::{NameGenerator, ResourceName};
pub use readiness::{wait_until, Backoff};
