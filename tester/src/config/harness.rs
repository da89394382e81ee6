//! Harness Configuration
//!
//! Where the CLI lives, which cluster it talks to, and how long the harness
//! waits for things.

use std::path::PathBuf;
use std::time::Duration;

use shared::{HarnessError, HarnessResult};

use crate::runtime::Backoff;

pub const DEFAULT_CLI_PATH: &str = "./target/release/kafka-cli";
pub const DEFAULT_BOOTSTRAP_SERVER: &str = "localhost:9093";
pub const DEFAULT_INVALID_BOOTSTRAP_SERVER: &str = "invalid-server:9999";
pub const DEFAULT_PREFIX: &str = "clitest";

#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    pub cli_path: PathBuf,
    pub bootstrap_server: String,
    /// Address nothing listens on, for the connection-failure scenario
    pub invalid_bootstrap_server: String,
    pub name_prefix: String,
    pub command_timeout: Duration,
    /// Bounded consumes give up sooner than other commands
    pub consume_timeout: Duration,
    /// Pause between scenarios
    pub settle_delay: Duration,
    /// Polling policy for a new topic to show up in `topics list`
    pub topic_readiness: Backoff,
    pub offset_commit_wait: Duration,
    pub member_join_wait: Duration,
    pub member_leave_wait: Duration,
    /// Gap between the two produce batches of the timestamp reset scenario
    pub timestamp_gap: Duration,
    /// SIGTERM grace for background consumers before they are killed
    pub background_grace: Duration,
    pub plain_output: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            cli_path: PathBuf::from(DEFAULT_CLI_PATH),
            bootstrap_server: DEFAULT_BOOTSTRAP_SERVER.to_string(),
            invalid_bootstrap_server: DEFAULT_INVALID_BOOTSTRAP_SERVER.to_string(),
            name_prefix: DEFAULT_PREFIX.to_string(),
            command_timeout: Duration::from_secs(30),
            consume_timeout: Duration::from_secs(10),
            settle_delay: Duration::from_millis(500),
            topic_readiness: Backoff::default(),
            offset_commit_wait: Duration::from_secs(2),
            member_join_wait: Duration::from_secs(3),
            member_leave_wait: Duration::from_secs(3),
            timestamp_gap: Duration::from_secs(2),
            background_grace: Duration::from_secs(5),
            plain_output: false,
        }
    }
}

impl HarnessConfig {
    /// Create a new builder
    pub fn builder() -> crate::config::builder::HarnessConfigBuilder {
        crate::config::builder::HarnessConfigBuilder::new()
    }

    /// Check the values a run cannot start without
    pub fn validate(&self) -> HarnessResult<()> {
        if self.bootstrap_server.trim().is_empty() {
            return Err(HarnessError::config("bootstrap_server", "<empty>"));
        }
        if self.name_prefix.trim().is_empty() || self.name_prefix.contains(char::is_whitespace) {
            return Err(HarnessError::config("name_prefix", &self.name_prefix));
        }
        if self.command_timeout.is_zero() || self.consume_timeout.is_zero() {
            return Err(HarnessError::config(
                "timeout",
                format!("{:?}/{:?}", self.command_timeout, self.consume_timeout),
            ));
        }
        if !self.cli_path.is_file() {
            return Err(HarnessError::config("cli_path", self.cli_path.display().to_string()));
        }
        Ok(())
    }
}
