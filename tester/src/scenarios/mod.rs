//! Test Scenarios
//!
//! The ordered catalog of scenario groups and the suite driver that runs
//! them. Every scenario runs regardless of how its siblings did.

pub mod basic;
pub mod configs;
pub mod errors;
pub mod groups;
pub mod messaging;
pub mod runner;
pub mod topics;

use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;

use shared::{HarnessError, HarnessResult, RunId};

use crate::testing::{Reporter, ResultAggregator, RunReport, Verdict};
pub use runner::{panic_message, Phase, Scenario, ScenarioContext, ScenarioFn, ScenarioRunner};

/// Named, ordered set of scenarios
#[derive(Debug, Clone)]
pub struct ScenarioGroup {
    pub name: &'static str,
    pub scenarios: Vec<Scenario>,
}

impl ScenarioGroup {
    fn new(name: &'static str, scenarios: Vec<Scenario>) -> Self {
        Self { name, scenarios }
    }
}

pub struct TestScenarios {
    runner: ScenarioRunner,
    reporter: Reporter,
    run_id: RunId,
}

impl TestScenarios {
    pub fn new(runner: ScenarioRunner, reporter: Reporter) -> Self {
        Self {
            runner,
            reporter,
            run_id: RunId::new(),
        }
    }

    /// Every group in run order
    pub fn catalog() -> Vec<ScenarioGroup> {
        vec![
            ScenarioGroup::new(
                "basic",
                vec![
                    Scenario::new("help_command", |ctx| basic::help_command(ctx).boxed()),
                    Scenario::new("version_command", |ctx| basic::version_command(ctx).boxed()),
                ],
            ),
            ScenarioGroup::new(
                "topics",
                vec![
                    Scenario::new("topics_list", |ctx| topics::topics_list(ctx).boxed()),
                    Scenario::new("topic_lifecycle", |ctx| topics::topic_lifecycle(ctx).boxed()),
                    Scenario::new("topic_describe", |ctx| topics::topic_describe(ctx).boxed()),
                    Scenario::new("topics_list_idempotent", |ctx| topics::topics_list_idempotent(ctx).boxed()),
                ],
            ),
            ScenarioGroup::new(
                "configs",
                vec![Scenario::new("topic_configs", |ctx| configs::topic_configs(ctx).boxed())],
            ),
            ScenarioGroup::new(
                "messaging",
                vec![Scenario::new("produce_and_consume", |ctx| {
                    messaging::produce_and_consume(ctx).boxed()
                })],
            ),
            ScenarioGroup::new(
                "consumer-groups",
                vec![
                    Scenario::new("consumer_groups_list", |ctx| groups::consumer_groups_list(ctx).boxed()),
                    Scenario::new("consumer_group_describe", |ctx| groups::consumer_group_describe(ctx).boxed()),
                    Scenario::new("reset_offsets_dry_run_then_execute", |ctx| {
                        groups::reset_offsets_dry_run_then_execute(ctx).boxed()
                    }),
                    Scenario::new("reset_offsets_partition_filter", |ctx| {
                        groups::reset_offsets_partition_filter(ctx).boxed()
                    }),
                    Scenario::new("reset_offsets_by_timestamp", |ctx| {
                        groups::reset_offsets_by_timestamp(ctx).boxed()
                    }),
                    Scenario::new("delete_group_with_active_member", |ctx| {
                        groups::delete_group_with_active_member(ctx).boxed()
                    }),
                ],
            ),
            ScenarioGroup::new(
                "errors",
                vec![Scenario::new("invalid_bootstrap_server", |ctx| {
                    errors::invalid_bootstrap_server(ctx).boxed()
                })],
            ),
        ]
    }

    /// Names accepted by [`TestScenarios::select`]: `all`, group names, scenario names
    pub fn available_scenarios() -> Vec<&'static str> {
        let mut names = vec!["all"];
        for group in Self::catalog() {
            names.push(group.name);
            names.extend(group.scenarios.iter().map(|s| s.name));
        }
        names
    }

    /// Groups to run for `name`, trimmed to the one scenario when it names one
    pub fn select(name: &str) -> HarnessResult<Vec<ScenarioGroup>> {
        let catalog = Self::catalog();
        if name == "all" {
            return Ok(catalog);
        }

        if let Some(group) = catalog.iter().find(|g| g.name == name) {
            return Ok(vec![group.clone()]);
        }

        for group in catalog {
            if let Some(scenario) = group.scenarios.iter().find(|s| s.name == name) {
                return Ok(vec![ScenarioGroup::new(group.name, vec![*scenario])]);
            }
        }

        Err(HarnessError::UnknownScenario {
            name: name.to_string(),
            available: Self::available_scenarios().join(", "),
        })
    }

    pub async fn run_selection(&self, name: &str) -> HarnessResult<RunReport> {
        let groups = Self::select(name)?;
        Ok(self.run_groups(&groups).await)
    }

    async fn run_groups(&self, groups: &[ScenarioGroup]) -> RunReport {
        let total: usize = groups.iter().map(|g| g.scenarios.len()).sum();
        tracing::info!("🧪 Running {} scenario(s) in {} group(s), run {}", total, groups.len(), self.run_id.short());

        let mut aggregator = ResultAggregator::new(self.run_id.clone());
        for group in groups {
            println!("{}", self.reporter.group_header(group.name));

            for scenario in &group.scenarios {
                if aggregator.recorded() > 0 {
                    self.settle().await;
                }

                // The runner already contains scenario panics; this catches its own
                let verdict = AssertUnwindSafe(self.runner.run(scenario))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| {
                        Verdict::Error(format!("scenario runner panicked: {}", panic_message(payload.as_ref())))
                    });

                println!("{}", self.reporter.scenario_line(scenario.name, &verdict));
                aggregator.record(group.name, scenario.name, &verdict);
            }
        }

        let report = aggregator.summarize();
        tracing::info!(
            "🏁 Suite finished: {} passed, {} failed, {} errored",
            report.passed,
            report.failed,
            report.errored
        );
        report
    }

    async fn settle(&self) {
        let delay = self.runner.config().settle_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarnessConfig;
    use crate::runtime::{CommandResult, MockCommandRunner};
    use crate::testing::{markers, OutputStyle};
    use assert_matches::assert_matches;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn suite(runner: MockCommandRunner) -> TestScenarios {
        let config = HarnessConfig::builder().without_waits().build();
        TestScenarios::new(
            ScenarioRunner::new(config, Arc::new(runner)),
            Reporter::new(OutputStyle::Plain),
        )
    }

    #[test]
    fn test_catalog_order_and_unique_names() {
        let catalog = TestScenarios::catalog();
        let groups: Vec<&str> = catalog.iter().map(|g| g.name).collect();
        assert_eq!(
            groups,
            vec!["basic", "topics", "configs", "messaging", "consumer-groups", "errors"]
        );

        let names = TestScenarios::available_scenarios();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(unique.len(), names.len());
        assert_eq!(names.len(), 1 + 6 + 15);
    }

    #[test]
    fn test_select_group_and_single_scenario() {
        let groups = TestScenarios::select("consumer-groups").unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].scenarios.len(), 6);

        let groups = TestScenarios::select("topic_describe").unwrap();
        assert_eq!(groups[0].name, "topics");
        assert_eq!(groups[0].scenarios.len(), 1);
        assert_eq!(groups[0].scenarios[0].name, "topic_describe");

        assert_eq!(TestScenarios::select("all").unwrap().len(), 6);
    }

    #[test]
    fn test_select_unknown_lists_available() {
        let err = TestScenarios::select("nope").unwrap_err();
        assert_matches!(&err, HarnessError::UnknownScenario { name, available }
            if name == "nope" && available.contains("reset_offsets_by_timestamp"));
    }

    #[tokio::test]
    async fn test_basic_group_passes_against_conforming_cli() {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(|inv| match inv.args()[0].as_str() {
            "--help" => CommandResult::new(
                0,
                format!("{}\n\nCommands:\n  topics\n  produce\n  consume\n", markers::HELP_ABOUT),
                "",
            ),
            "--version" => CommandResult::new(0, "kafka-cli 0.1.0\n", ""),
            _ => CommandResult::new(1, "", "unexpected"),
        });

        let report = suite(runner).run_selection("basic").await.unwrap();
        assert_eq!(report.passed, 2);
        assert_eq!(report.exit_status(), 0);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_group() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .times(2)
            .returning(|_| CommandResult::new(2, "", "error: unrecognized argument"));

        let report = suite(runner).run_selection("basic").await.unwrap();
        assert_eq!(report.failed, 2);
        assert_eq!(report.exit_status(), 1);
        let failing: Vec<&str> = report.failures.iter().map(|f| f.scenario.as_str()).collect();
        assert_eq!(failing, vec!["help_command", "version_command"]);
        assert!(report.failures[0].reason.contains("exit_code=2"));
    }

    #[tokio::test]
    async fn test_invalid_bootstrap_server_scenario() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .withf(|inv| inv.args().contains(&"invalid-server:9999".to_string()))
            .times(1)
            .return_const(CommandResult::new(1, "", "Error: Failed to fetch metadata"));

        let report = suite(runner).run_selection("invalid_bootstrap_server").await.unwrap();
        assert_eq!(report.passed, 1);
    }

    #[tokio::test]
    async fn test_invalid_bootstrap_server_accepting_cli_fails() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .return_const(CommandResult::new(0, "Topics:\n", ""));

        let report = suite(runner).run_selection("errors").await.unwrap();
        assert_eq!(report.failed, 1);
        assert!(report.failures[0].reason.contains("invalid-server:9999"));
    }
}
