//! Functional Test Harness for the Kafka CLI
//!
//! Drives the `kafka-cli` executable as a black box: every scenario runs the
//! real binary against a live cluster, checks exit codes and output markers,
//! and deletes whatever it created.
//!
//! ## Main Interface
//!
//! [`TestScenarios`] holds the ordered catalog and runs it; each scenario is
//! an async function over a [`ScenarioContext`] that uses the step library
//! ([`KafkaCli`]) and returns a [`ScenarioResult`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kcli_tester::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> shared::HarnessResult<()> {
//! let config = HarnessConfig::builder()
//!     .cli_path("./target/release/kafka-cli")
//!     .bootstrap_server("localhost:9093")
//!     .build();
//!
//! let cli = Arc::new(CliProcess::new(config.cli_path.clone()));
//! let suite = TestScenarios::new(ScenarioRunner::new(config, cli), Reporter::new(OutputStyle::Plain));
//!
//! let report = suite.run_selection("topics").await?;
//! std::process::exit(report.exit_status());
//! # }
//! ```

// Core modules
pub mod config;
pub mod runtime;
pub mod scenarios;
pub mod testing;

// Main interfaces - re-exported at crate root for convenience
pub use config::{HarnessConfig, HarnessConfigBuilder};
pub use scenarios::{Phase, Scenario, ScenarioContext, ScenarioGroup, ScenarioRunner, TestScenarios};
pub use testing::{KafkaCli, OutputStyle, Reporter, RunReport, ScenarioError, ScenarioResult, Verdict};

// Supporting types
pub use runtime::{BackgroundHandle, CleanupManager, CliProcess, CommandInvocation, CommandResult, CommandRunner};
pub use testing::{ResultAggregator, Step};
