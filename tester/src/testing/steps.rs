//! Scenario Step Library
//!
//! One method per CLI operation. Each builds the argument vector, runs it
//! through the [`CommandRunner`] and returns a [`Step`]: the raw
//! [`CommandResult`] together with the derived check, so a scenario can
//! combine several checks and still report exit codes and stderr.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use super::markers;
use super::parse::{self, PartitionOffset};
use crate::runtime::{BackgroundHandle, CommandInvocation, CommandResult, CommandRunner};
use shared::HarnessResult;

/// Raw result of one call plus what the step derived from it
#[derive(Debug, Clone)]
pub struct Step<T = bool> {
    pub result: CommandResult,
    pub check: T,
}

impl<T> Step<T> {
    fn derive(result: CommandResult, derive: impl FnOnce(&CommandResult) -> T) -> Self {
        let check = derive(&result);
        Self { result, check }
    }
}

impl Step<bool> {
    pub fn passed(&self) -> bool {
        self.check
    }
}

/// What `topics describe` reported about one topic
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicDescription {
    pub names_topic: bool,
    pub partitions: Option<u32>,
    pub has_leader: bool,
    pub has_replicas: bool,
}

impl TopicDescription {
    /// Every field `topics describe` is expected to print
    pub fn missing_fields(&self, expected_partitions: u32) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.names_topic {
            missing.push("topic name");
        }
        if self.partitions != Some(expected_partitions) {
            missing.push("partition count");
        }
        if !self.has_leader {
            missing.push("leader info");
        }
        if !self.has_replicas {
            missing.push("replicas info");
        }
        missing
    }
}

/// What `consumer-groups describe` reported about one group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupDescription {
    pub names_group: bool,
    pub has_state: bool,
    pub offsets: Vec<PartitionOffset>,
}

impl GroupDescription {
    pub fn committed_offset(&self, topic: &str, partition: i32) -> Option<i64> {
        parse::committed_offset(&self.offsets, topic, partition)
    }
}

/// Parameters of a bounded `consume` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumeRequest {
    topic: String,
    group: Option<String>,
    from_beginning: bool,
    max_messages: Option<usize>,
}

impl ConsumeRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            group: None,
            from_beginning: false,
            max_messages: None,
        }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn from_beginning(mut self) -> Self {
        self.from_beginning = true;
        self
    }

    pub fn max_messages(mut self, count: usize) -> Self {
        self.max_messages = Some(count);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTarget {
    Earliest,
    /// Milliseconds since the Unix epoch
    Datetime(i64),
}

/// Parameters of `consumer-groups reset-offsets`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetRequest {
    group: String,
    topic: String,
    target: ResetTarget,
    partitions: Option<Vec<i32>>,
    execute: bool,
}

impl ResetRequest {
    /// Dry run by default; call [`ResetRequest::execute`] to apply
    pub fn new(group: impl Into<String>, topic: impl Into<String>, target: ResetTarget) -> Self {
        Self {
            group: group.into(),
            topic: topic.into(),
            target,
            partitions: None,
            execute: false,
        }
    }

    pub fn partitions(mut self, partitions: &[i32]) -> Self {
        self.partitions = Some(partitions.to_vec());
        self
    }

    pub fn execute(mut self) -> Self {
        self.execute = true;
        self
    }
}

/// Typed front end to the CLI under test
#[derive(Clone)]
pub struct KafkaCli {
    runner: Arc<dyn CommandRunner>,
    bootstrap_server: String,
    timeout: Duration,
    consume_timeout: Duration,
}

impl std::fmt::Debug for KafkaCli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaCli")
            .field("bootstrap_server", &self.bootstrap_server)
            .field("timeout", &self.timeout)
            .field("consume_timeout", &self.consume_timeout)
            .finish()
    }
}

impl KafkaCli {
    pub fn new(runner: Arc<dyn CommandRunner>, bootstrap_server: impl Into<String>) -> Self {
        Self {
            runner,
            bootstrap_server: bootstrap_server.into(),
            timeout: crate::runtime::invoker::DEFAULT_TIMEOUT,
            consume_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeouts(mut self, timeout: Duration, consume_timeout: Duration) -> Self {
        self.timeout = timeout;
        self.consume_timeout = consume_timeout;
        self
    }

    /// Same CLI pointed at another bootstrap server
    pub fn with_bootstrap_server(&self, bootstrap_server: impl Into<String>) -> Self {
        Self {
            bootstrap_server: bootstrap_server.into(),
            ..self.clone()
        }
    }

    pub fn bootstrap_server(&self) -> &str {
        &self.bootstrap_server
    }

    // ----- top level -----

    pub async fn help(&self) -> Step {
        let result = self.call(vec!["--help".to_string()]).await;
        Step::derive(result, |r| {
            r.success()
                && r.stdout_contains(markers::HELP_ABOUT)
                && markers::HELP_SUBCOMMANDS.iter().all(|cmd| r.stdout_contains(cmd))
        })
    }

    pub async fn version(&self) -> Step {
        let result = self.call(vec!["--version".to_string()]).await;
        Step::derive(result, |r| r.success() && r.stdout_contains(markers::VERSION_BINARY_NAME))
    }

    // ----- topics -----

    /// Listed topic names; empty when the call failed
    pub async fn list_topics(&self) -> Step<BTreeSet<String>> {
        let result = self.call(self.admin("topics", "list", &[])).await;
        Step::derive(result, |r| {
            if r.success() {
                parse::topic_names(&r.stdout)
            } else {
                BTreeSet::new()
            }
        })
    }

    pub async fn create_topic(&self, topic: &str, partitions: u32, replication_factor: u32) -> Step {
        let partitions = partitions.to_string();
        let replication_factor = replication_factor.to_string();
        let args = self.admin(
            "topics",
            "create",
            &[
                "--topic",
                topic,
                "--partitions",
                partitions.as_str(),
                "--replication-factor",
                replication_factor.as_str(),
            ],
        );
        let result = self.call(args).await;
        Step::derive(result, |r| {
            r.success() && r.stdout.to_lowercase().contains(markers::TOPIC_CREATED)
        })
    }

    pub async fn describe_topic(&self, topic: &str) -> Step<TopicDescription> {
        let result = self.call(self.admin("topics", "describe", &["--topic", topic])).await;
        Step::derive(result, |r| {
            if !r.success() {
                return TopicDescription::default();
            }
            TopicDescription {
                names_topic: r.stdout_contains(topic),
                partitions: parse::partition_count(&r.stdout),
                has_leader: r.stdout_contains(markers::LEADER),
                has_replicas: r.stdout_contains(markers::REPLICAS),
            }
        })
    }

    pub async fn delete_topic(&self, topic: &str) -> Step {
        let result = self.call(self.admin("topics", "delete", &["--topic", topic])).await;
        Step::derive(result, CommandResult::success)
    }

    // ----- configs -----

    pub async fn describe_configs(&self, topic: &str) -> Step {
        let args = self.admin(
            "configs",
            "describe",
            &["--entity-type", "topic", "--entity-name", topic],
        );
        let result = self.call(args).await;
        Step::derive(result, CommandResult::success)
    }

    /// `key=value` config entry on a topic
    pub async fn alter_config(&self, topic: &str, entry: &str) -> Step {
        let args = self.admin(
            "configs",
            "alter",
            &["--entity-type", "topic", "--entity-name", topic, "--add-config", entry],
        );
        let result = self.call(args).await;
        Step::derive(result, CommandResult::success)
    }

    // ----- produce / consume -----

    /// Newline-separated records on stdin; `key_separator` splits key from value
    pub async fn produce<S: AsRef<str>>(&self, topic: &str, records: &[S], key_separator: Option<&str>) -> Step {
        let mut args = vec![
            "produce".to_string(),
            "--bootstrap-server".to_string(),
            self.bootstrap_server.clone(),
            "--topic".to_string(),
            topic.to_string(),
        ];
        if let Some(separator) = key_separator {
            args.push("--key-separator".to_string());
            args.push(separator.to_string());
        }

        let payload = records.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("\n");
        let invocation = CommandInvocation::new(args).with_input(payload).with_timeout(self.timeout);
        let result = self.runner.run(invocation).await;
        Step::derive(result, CommandResult::success)
    }

    /// Bounded consume; runs under the shorter consume timeout
    pub async fn consume(&self, request: &ConsumeRequest) -> Step {
        let invocation = CommandInvocation::new(self.consume_args(request)).with_timeout(self.consume_timeout);
        let result = self.runner.run(invocation).await;
        Step::derive(result, CommandResult::success)
    }

    /// Open-ended consumer that stays a live group member until stopped
    pub async fn consume_in_background(&self, topic: &str, group: &str) -> HarnessResult<BackgroundHandle> {
        let request = ConsumeRequest::new(topic).group(group);
        self.runner.spawn_background(self.consume_args(&request)).await
    }

    // ----- consumer groups -----

    pub async fn list_groups(&self) -> Step {
        let result = self.call(self.admin("consumer-groups", "list", &[])).await;
        Step::derive(result, |r| {
            r.success() && (r.stdout_contains(markers::GROUPS_HEADER) || r.stdout_contains(markers::NO_GROUPS))
        })
    }

    pub async fn describe_group(&self, group: &str) -> Step<GroupDescription> {
        let result = self.call(self.admin("consumer-groups", "describe", &["--group", group])).await;
        Step::derive(result, |r| {
            if !r.success() {
                return GroupDescription::default();
            }
            GroupDescription {
                names_group: r.stdout_contains(group),
                has_state: r.stdout_contains(markers::GROUP_STATE),
                offsets: parse::offset_table(&r.stdout),
            }
        })
    }

    /// Passes on exit 0 plus the dry-run banner, or the success line when executing
    pub async fn reset_offsets(&self, request: &ResetRequest) -> Step {
        let mut extra: Vec<String> = vec![
            "--group".into(),
            request.group.clone(),
            "--topic".into(),
            request.topic.clone(),
        ];
        match request.target {
            ResetTarget::Earliest => extra.push("--to-earliest".into()),
            ResetTarget::Datetime(millis) => {
                extra.push("--to-datetime".into());
                extra.push(millis.to_string());
            }
        }
        if let Some(partitions) = &request.partitions {
            extra.push("--partitions".into());
            extra.push(
                partitions
                    .iter()
                    .map(i32::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            );
        }
        if request.execute {
            extra.push("--execute".into());
        }

        let extra: Vec<&str> = extra.iter().map(String::as_str).collect();
        let result = self.call(self.admin("consumer-groups", "reset-offsets", &extra)).await;
        let marker = if request.execute {
            markers::RESET_SUCCESS
        } else {
            markers::DRY_RUN
        };
        Step::derive(result, |r| r.success() && r.stdout_contains(marker))
    }

    pub async fn delete_group(&self, group: &str) -> Step {
        let result = self.call(self.admin("consumer-groups", "delete", &["--group", group])).await;
        Step::derive(result, CommandResult::success)
    }

    // ----- helpers -----

    /// `<command> --bootstrap-server S <action> <extra...>`
    fn admin(&self, command: &str, action: &str, extra: &[&str]) -> Vec<String> {
        let mut args = vec![
            command.to_string(),
            "--bootstrap-server".to_string(),
            self.bootstrap_server.clone(),
            action.to_string(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        args
    }

    fn consume_args(&self, request: &ConsumeRequest) -> Vec<String> {
        let mut args = vec![
            "consume".to_string(),
            "--bootstrap-server".to_string(),
            self.bootstrap_server.clone(),
            "--topic".to_string(),
            request.topic.clone(),
        ];
        if let Some(group) = &request.group {
            args.push("--group".to_string());
            args.push(group.clone());
        }
        if request.from_beginning {
            args.push("--from-beginning".to_string());
        }
        if let Some(max) = request.max_messages {
            args.push("--max-messages".to_string());
            args.push(max.to_string());
        }
        args
    }

    async fn call(&self, args: Vec<String>) -> CommandResult {
        self.runner
            .run(CommandInvocation::new(args).with_timeout(self.timeout))
            .await
    }
}
