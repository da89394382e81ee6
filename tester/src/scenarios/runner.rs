//! Scenario Runner
//!
//! Drives one scenario through Setup, Exercise and Verify, always finishes
//! with Cleanup, and turns whatever happened into a [`Verdict`].

use futures_util::future::BoxFuture;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use shared::{scenario_debug, scenario_error, scenario_info, scenario_warn};

use crate::config::HarnessConfig;
use crate::runtime::{
    wait_until, CleanupManager, CommandRunner, NameGenerator, ResourceName, TrackedResource, SENTINEL_EXIT_CODE,
};
use crate::testing::{expect_step, ConsumeRequest, KafkaCli, ScenarioError, ScenarioResult, Verdict};

/// Scenario body: takes its own context, resolves to pass/fail/fault
pub type ScenarioFn = fn(ScenarioContext) -> BoxFuture<'static, ScenarioResult>;

#[derive(Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub body: ScenarioFn,
}

impl Scenario {
    pub const fn new(name: &'static str, body: ScenarioFn) -> Self {
        Self { name, body }
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    Exercise,
    Verify,
    Cleanup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Setup => "Setup",
            Phase::Exercise => "Exercise",
            Phase::Verify => "Verify",
            Phase::Cleanup => "Cleanup",
        };
        f.write_str(label)
    }
}

/// Everything a scenario body gets to work with
#[derive(Debug, Clone)]
pub struct ScenarioContext {
    scenario: &'static str,
    cli: KafkaCli,
    names: Arc<NameGenerator>,
    cleanup: CleanupManager,
    config: Arc<HarnessConfig>,
    phase: Arc<Mutex<Phase>>,
}

impl ScenarioContext {
    fn new(scenario: &'static str, cli: KafkaCli, names: Arc<NameGenerator>, config: Arc<HarnessConfig>) -> Self {
        Self {
            scenario,
            cli,
            names,
            cleanup: CleanupManager::new(),
            config,
            phase: Arc::new(Mutex::new(Phase::Setup)),
        }
    }

    pub fn scenario(&self) -> &'static str {
        self.scenario
    }

    pub fn cli(&self) -> &KafkaCli {
        &self.cli
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn names(&self) -> &NameGenerator {
        &self.names
    }

    pub fn cleanup(&self) -> &CleanupManager {
        &self.cleanup
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn enter(&self, phase: Phase) {
        *self.phase.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = phase;
        scenario_debug!(self.scenario, "➡️ {} phase", phase);
    }

    /// Create a uniquely named topic, track it for cleanup and wait until
    /// `topics list` shows it
    ///
    /// The topic is tracked before the call: a create that timed out or was
    /// killed may still have reached the broker. Only an outright refusal
    /// from the CLI drops it again.
    pub async fn create_topic(&self, scope: &str, partitions: u32) -> Result<ResourceName, ScenarioError> {
        let topic = self.names.next_scoped(scope);
        self.cleanup.register_topic(topic.as_str());
        let step = self.cli.create_topic(topic.as_str(), partitions, 1).await;
        if !step.result.success() && step.result.exit_code != SENTINEL_EXIT_CODE {
            self.cleanup.forget(&TrackedResource::Topic(topic.to_string()));
        }
        expect_step(&step, &format!("failed to create topic '{}'", topic))?;

        let cli = self.cli.clone();
        let probe_name = topic.clone();
        let visible = wait_until(&format!("topic '{}' to be listed", topic), self.config.topic_readiness, move || {
            let cli = cli.clone();
            let name = probe_name.clone();
            async move { cli.list_topics().await.check.contains(name.as_str()) }
        })
        .await;
        if !visible {
            scenario_warn!(self.scenario, "⚠️ Topic '{}' not listed yet, continuing", topic);
        }

        Ok(topic)
    }

    /// Consumer group name derived from the topic, tracked for cleanup
    pub fn group_for(&self, topic: &ResourceName) -> ResourceName {
        let group = topic.derive("group");
        self.cleanup.register_group(group.as_str());
        group
    }

    /// Produce `records` and give the cluster a moment to settle
    pub async fn seed<S: AsRef<str>>(&self, topic: &ResourceName, records: &[S]) -> ScenarioResult {
        let step = self.cli.produce(topic.as_str(), records, None).await;
        expect_step(&step, &format!("failed to produce {} record(s) to '{}'", records.len(), topic))?;
        self.pause(self.config.settle_delay, "produced records").await;
        Ok(())
    }

    /// Read `count` records from the start as `group` and wait for the
    /// offsets to be committed
    pub async fn consume_committing(&self, topic: &ResourceName, group: &ResourceName, count: usize) -> ScenarioResult {
        let request = ConsumeRequest::new(topic.as_str())
            .group(group.as_str())
            .from_beginning()
            .max_messages(count);
        let step = self.cli.consume(&request).await;
        expect_step(&step, &format!("group '{}' could not consume from '{}'", group, topic))?;
        self.pause(self.config.offset_commit_wait, "offset commit").await;
        Ok(())
    }

    /// Fixed wait for an effect the CLI offers no way to observe
    pub async fn pause(&self, duration: Duration, reason: &str) {
        if duration.is_zero() {
            return;
        }
        scenario_debug!(self.scenario, "⏳ Waiting {:?} for {}", duration, reason);
        tokio::time::sleep(duration).await;
    }
}

/// Runs scenarios one at a time against one CLI
pub struct ScenarioRunner {
    cli: KafkaCli,
    names: Arc<NameGenerator>,
    config: Arc<HarnessConfig>,
}

impl ScenarioRunner {
    pub fn new(config: HarnessConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let cli = KafkaCli::new(runner, config.bootstrap_server.clone())
            .with_timeouts(config.command_timeout, config.consume_timeout);
        let names = Arc::new(NameGenerator::new(config.name_prefix.clone()));
        Self {
            cli,
            names,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub async fn run(&self, scenario: &Scenario) -> Verdict {
        let ctx = ScenarioContext::new(scenario.name, self.cli.clone(), self.names.clone(), self.config.clone());
        let started = Instant::now();
        scenario_info!(scenario.name, "🧪 Running {}", scenario.name);

        // Own task, so a panic in the body surfaces as a JoinError
        let outcome = tokio::spawn((scenario.body)(ctx.clone())).await;
        let last_phase = ctx.phase();

        ctx.enter(Phase::Cleanup);
        let report = ctx.cleanup.cleanup(&self.cli).await;
        if !report.is_clean() {
            scenario_warn!(
                scenario.name,
                "⚠️ {} resource(s) left behind: {:?}",
                report.failed.len(),
                report.failed
            );
        }

        let verdict = match outcome {
            Ok(Ok(())) => Verdict::Pass,
            Ok(Err(ScenarioError::Failed(reason))) => Verdict::Fail(reason),
            Ok(Err(ScenarioError::Fault(err))) => Verdict::Error(format!("harness fault during {}: {}", last_phase, err)),
            Err(join) if join.is_panic() => Verdict::Error(format!(
                "panicked during {}: {}",
                last_phase,
                panic_message(join.into_panic().as_ref())
            )),
            Err(join) => Verdict::Error(format!("scenario task cancelled during {}: {}", last_phase, join)),
        };

        let elapsed = started.elapsed();
        match &verdict {
            Verdict::Pass => scenario_info!(scenario.name, "✅ {} passed in {:?}", scenario.name, elapsed),
            Verdict::Fail(reason) => scenario_warn!(scenario.name, "❌ {} failed in {:?}: {}", scenario.name, elapsed, reason),
            Verdict::Error(reason) => scenario_error!(scenario.name, "💥 {} errored in {:?}: {}", scenario.name, elapsed, reason),
        }
        verdict
    }
}

/// Text of a panic payload, when it carries one
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{CommandInvocation, CommandResult, MockCommandRunner};
    use crate::testing::ensure;
    use assert_matches::assert_matches;
    use futures_util::FutureExt;
    use shared::HarnessError;
    use std::sync::Mutex as StdMutex;

    type Calls = Arc<StdMutex<Vec<Vec<String>>>>;

    /// Mock CLI that accepts everything and records each argument vector
    fn recording_runner() -> (ScenarioRunner, Calls) {
        let calls: Calls = Arc::new(StdMutex::new(Vec::new()));
        let seen = calls.clone();
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(move |inv: CommandInvocation| {
            seen.lock().unwrap().push(inv.args().to_vec());
            match inv.subcommand() {
                "topics" if inv.args().get(3).map(String::as_str) == Some("create") => {
                    CommandResult::new(0, "Topic created successfully", "")
                }
                "topics" if inv.args().get(3).map(String::as_str) == Some("list") => {
                    CommandResult::new(0, "Topics:\n  unrelated\n", "")
                }
                _ => CommandResult::new(0, "", ""),
            }
        });
        let config = HarnessConfig::builder().name_prefix("unit").without_waits().build();
        (ScenarioRunner::new(config, Arc::new(runner)), calls)
    }

    fn deletions(calls: &Calls) -> Vec<String> {
        calls
            .lock()
            .unwrap()
            .iter()
            .filter(|args| args.get(3).map(String::as_str) == Some("delete"))
            .map(|args| format!("{} {}", args[0], args[5]))
            .collect()
    }

    async fn passing(ctx: ScenarioContext) -> ScenarioResult {
        let topic = ctx.create_topic("pass", 1).await?;
        let _group = ctx.group_for(&topic);
        ctx.enter(Phase::Verify);
        ensure(true, "unused")
    }

    async fn failing(ctx: ScenarioContext) -> ScenarioResult {
        ctx.create_topic("fail", 1).await?;
        ctx.enter(Phase::Verify);
        ensure(false, "marker missing")
    }

    async fn faulting(ctx: ScenarioContext) -> ScenarioResult {
        ctx.create_topic("fault", 1).await?;
        ctx.enter(Phase::Exercise);
        Err(HarnessError::Spawn {
            program: "kafka-cli".into(),
            message: "no such file".into(),
        }
        .into())
    }

    async fn panicking(ctx: ScenarioContext) -> ScenarioResult {
        ctx.create_topic("panic", 1).await?;
        ctx.enter(Phase::Exercise);
        panic!("step blew up");
    }

    #[tokio::test]
    async fn test_pass_cleans_groups_then_topics() {
        let (runner, calls) = recording_runner();
        let verdict = runner.run(&Scenario::new("passing", |ctx| passing(ctx).boxed())).await;

        assert_eq!(verdict, Verdict::Pass);
        let deleted = deletions(&calls);
        assert_eq!(deleted.len(), 2);
        assert!(deleted[0].starts_with("consumer-groups unit_pass_"));
        assert!(deleted[1].starts_with("topics unit_pass_"));
    }

    #[tokio::test]
    async fn test_failure_still_cleans_up_once() {
        let (runner, calls) = recording_runner();
        let verdict = runner.run(&Scenario::new("failing", |ctx| failing(ctx).boxed())).await;

        assert_eq!(verdict, Verdict::Fail("marker missing".into()));
        assert_eq!(deletions(&calls).len(), 1);
    }

    #[tokio::test]
    async fn test_fault_becomes_error_and_cleans_up_once() {
        let (runner, calls) = recording_runner();
        let verdict = runner.run(&Scenario::new("faulting", |ctx| faulting(ctx).boxed())).await;

        assert_matches!(verdict, Verdict::Error(reason) if reason.contains("during Exercise") && reason.contains("kafka-cli"));
        assert_eq!(deletions(&calls).len(), 1);
    }

    #[tokio::test]
    async fn test_panic_becomes_error_and_cleans_up_once() {
        let (runner, calls) = recording_runner();
        let verdict = runner.run(&Scenario::new("panicking", |ctx| panicking(ctx).boxed())).await;

        assert_matches!(verdict, Verdict::Error(reason) if reason == "panicked during Exercise: step blew up");
        assert_eq!(deletions(&calls).len(), 1);
    }

    #[tokio::test]
    async fn test_refused_create_is_not_tracked() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|inv| inv.args().get(3).map(String::as_str) == Some("create"))
            .times(1)
            .return_const(CommandResult::new(1, "", "Error: broker unreachable"));
        let config = HarnessConfig::builder().without_waits().build();
        let runner = ScenarioRunner::new(config, Arc::new(runner));

        async fn body(ctx: ScenarioContext) -> ScenarioResult {
            ctx.create_topic("t", 1).await.map(|_| ())
        }

        let verdict = runner.run(&Scenario::new("create_fails", |ctx| body(ctx).boxed())).await;
        assert_matches!(verdict, Verdict::Fail(reason) if reason.contains("broker unreachable"));
    }

    #[tokio::test]
    async fn test_timed_out_create_is_still_cleaned_up() {
        let calls: Calls = Arc::new(StdMutex::new(Vec::new()));
        let seen = calls.clone();
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(move |inv: CommandInvocation| {
            seen.lock().unwrap().push(inv.args().to_vec());
            match inv.args().get(3).map(String::as_str) {
                Some("create") => CommandResult::timed_out_after(Duration::from_secs(30)),
                _ => CommandResult::new(1, "", "Error: topic does not exist"),
            }
        });
        let config = HarnessConfig::builder().name_prefix("unit").without_waits().build();
        let runner = ScenarioRunner::new(config, Arc::new(runner));

        async fn body(ctx: ScenarioContext) -> ScenarioResult {
            ctx.create_topic("slow", 1).await.map(|_| ())
        }

        let verdict = runner.run(&Scenario::new("create_times_out", |ctx| body(ctx).boxed())).await;
        assert_matches!(verdict, Verdict::Fail(reason) if reason.contains("timed out"));

        let deleted = deletions(&calls);
        assert_eq!(deleted.len(), 1);
        assert!(deleted[0].starts_with("topics unit_slow_"));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
