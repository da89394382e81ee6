//! Harness Configuration Builder

use super::HarnessConfig;
use crate::runtime::Backoff;
use std::path::PathBuf;
use std::time::Duration;

pub struct HarnessConfigBuilder {
    config: HarnessConfig,
}

impl HarnessConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: HarnessConfig::default(),
        }
    }

    /// Path to the CLI executable under test
    pub fn cli_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.cli_path = path.into();
        self
    }

    pub fn bootstrap_server<S: Into<String>>(mut self, server: S) -> Self {
        self.config.bootstrap_server = server.into();
        self
    }

    pub fn invalid_bootstrap_server<S: Into<String>>(mut self, server: S) -> Self {
        self.config.invalid_bootstrap_server = server.into();
        self
    }

    /// Prefix for every topic and group name the run creates
    pub fn name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.name_prefix = prefix.into();
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = timeout;
        self
    }

    pub fn consume_timeout(mut self, timeout: Duration) -> Self {
        self.config.consume_timeout = timeout;
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.config.settle_delay = delay;
        self
    }

    pub fn topic_readiness(mut self, backoff: Backoff) -> Self {
        self.config.topic_readiness = backoff;
        self
    }

    /// Fixed waits for group effects the CLI cannot be polled for
    pub fn group_waits(mut self, offset_commit: Duration, member_join: Duration, member_leave: Duration) -> Self {
        self.config.offset_commit_wait = offset_commit;
        self.config.member_join_wait = member_join;
        self.config.member_leave_wait = member_leave;
        self
    }

    pub fn timestamp_gap(mut self, gap: Duration) -> Self {
        self.config.timestamp_gap = gap;
        self
    }

    pub fn background_grace(mut self, grace: Duration) -> Self {
        self.config.background_grace = grace;
        self
    }

    pub fn plain_output(mut self, plain: bool) -> Self {
        self.config.plain_output = plain;
        self
    }

    /// Zero every wait; for tests against a mocked CLI
    pub fn without_waits(self) -> Self {
        self.settle_delay(Duration::ZERO)
            .group_waits(Duration::ZERO, Duration::ZERO, Duration::ZERO)
            .timestamp_gap(Duration::ZERO)
            .topic_readiness(Backoff {
                initial: Duration::from_millis(1),
                max_interval: Duration::from_millis(1),
                ceiling: Duration::from_millis(5),
            })
    }

    /// Build the configuration
    pub fn build(self) -> HarnessConfig {
        self.config
    }
}

impl Default for HarnessConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
