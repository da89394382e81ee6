//! Consumer group administration
//!
//! Every scenario here builds its own group by consuming from a fresh topic,
//! so offsets are known before the command under test runs.

use chrono::Utc;

use super::runner::{Phase, ScenarioContext};
use crate::runtime::{ResourceName, TrackedResource};
use crate::testing::{
    ensure, expect_rejected, expect_step, markers, with_result, GroupDescription, ResetRequest, ResetTarget,
    ScenarioError, ScenarioResult, Step,
};

fn numbered(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{}_{}", prefix, i)).collect()
}

/// Describe `group` and insist the table lists committed offsets for `topic`
async fn committed_offsets(
    ctx: &ScenarioContext,
    group: &ResourceName,
    topic: &ResourceName,
) -> Result<Step<GroupDescription>, ScenarioError> {
    let step = ctx.cli().describe_group(group.as_str()).await;
    ensure(step.result.success(), with_result("consumer-groups describe failed", &step.result))?;
    ensure(
        step.check.offsets.iter().any(|row| row.topic == topic.as_str()),
        if step.result.stdout_contains(markers::NO_COMMITTED_OFFSETS) {
            format!("group '{}' has no committed offsets", group)
        } else {
            format!("offsets table for '{}' is missing or unreadable", topic)
        },
    )?;
    Ok(step)
}

/// `consumer-groups list` prints the header or the empty-cluster line
pub async fn consumer_groups_list(ctx: ScenarioContext) -> ScenarioResult {
    ctx.enter(Phase::Exercise);
    let step = ctx.cli().list_groups().await;

    ctx.enter(Phase::Verify);
    expect_step(&step, "consumer-groups list printed neither the header nor the empty line")
}

/// A group that consumed from a topic can be described
pub async fn consumer_group_describe(ctx: ScenarioContext) -> ScenarioResult {
    let topic = ctx.create_topic("cg_desc", 2).await?;
    let group = ctx.group_for(&topic);
    ctx.seed(&topic, &numbered("msg", 3)).await?;
    ctx.consume_committing(&topic, &group, 3).await?;

    ctx.enter(Phase::Exercise);
    let step = ctx.cli().describe_group(group.as_str()).await;

    ctx.enter(Phase::Verify);
    ensure(step.result.success(), with_result("consumer-groups describe failed", &step.result))?;
    ensure(step.check.names_group, format!("describe output does not name '{}'", group))?;
    ensure(step.check.has_state, "describe output has no State line")
}

/// A dry run leaves offsets alone; `--execute` rewinds them to the start
pub async fn reset_offsets_dry_run_then_execute(ctx: ScenarioContext) -> ScenarioResult {
    let topic = ctx.create_topic("cg_reset", 2).await?;
    let group = ctx.group_for(&topic);
    ctx.seed(&topic, &numbered("msg", 5)).await?;
    ctx.consume_committing(&topic, &group, 5).await?;
    let before = committed_offsets(&ctx, &group, &topic).await?;

    ctx.enter(Phase::Exercise);
    let preview = ResetRequest::new(group.as_str(), topic.as_str(), ResetTarget::Earliest);
    let dry_run = ctx.cli().reset_offsets(&preview).await;
    let after_dry_run = committed_offsets(&ctx, &group, &topic).await?;
    let executed = ctx.cli().reset_offsets(&preview.clone().execute()).await;
    ctx.pause(ctx.config().settle_delay, "offset reset").await;
    let after_execute = committed_offsets(&ctx, &group, &topic).await?;

    ctx.enter(Phase::Verify);
    expect_step(&dry_run, "dry run did not print the DRY RUN banner")?;
    ensure(
        after_dry_run.check.offsets == before.check.offsets,
        format!(
            "dry run changed committed offsets: {:?} -> {:?}",
            before.check.offsets, after_dry_run.check.offsets
        ),
    )?;
    expect_step(&executed, "execute did not confirm the reset")?;

    let not_rewound: Vec<i32> = after_execute
        .check
        .offsets
        .iter()
        .filter(|row| row.topic == topic.as_str() && row.current_offset != 0)
        .map(|row| row.partition)
        .collect();
    ensure(
        not_rewound.is_empty(),
        format!("partitions {:?} were not reset to the earliest offset", not_rewound),
    )
}

/// `--partitions 0,1` resets only those partitions and leaves 2 alone
pub async fn reset_offsets_partition_filter(ctx: ScenarioContext) -> ScenarioResult {
    const TARGETED: [i32; 2] = [0, 1];
    const UNTOUCHED: i32 = 2;

    let topic = ctx.create_topic("cg_reset_partitions", 3).await?;
    let group = ctx.group_for(&topic);
    ctx.seed(&topic, &numbered("message", 9)).await?;
    ctx.consume_committing(&topic, &group, 9).await?;
    let before = committed_offsets(&ctx, &group, &topic).await?;

    ctx.enter(Phase::Exercise);
    let preview = ResetRequest::new(group.as_str(), topic.as_str(), ResetTarget::Earliest).partitions(&TARGETED);
    let dry_run = ctx.cli().reset_offsets(&preview).await;
    let executed = ctx.cli().reset_offsets(&preview.clone().execute()).await;
    ctx.pause(ctx.config().settle_delay, "offset reset").await;
    let after = committed_offsets(&ctx, &group, &topic).await?;

    ctx.enter(Phase::Verify);
    expect_step(&dry_run, "dry run with a partition filter failed")?;
    let filter = markers::partition_filter(&TARGETED);
    ensure(
        dry_run.result.stdout_contains(&filter),
        with_result(&format!("dry run did not report '{}'", filter), &dry_run.result),
    )?;
    expect_step(&executed, "execute with a partition filter failed")?;

    for partition in TARGETED {
        if before.check.committed_offset(topic.as_str(), partition).is_some() {
            let now = after.check.committed_offset(topic.as_str(), partition);
            ensure(
                now == Some(0),
                format!("partition {} was not reset (offset {:?})", partition, now),
            )?;
        }
    }

    let untouched_before = before.check.committed_offset(topic.as_str(), UNTOUCHED);
    let untouched_after = after.check.committed_offset(topic.as_str(), UNTOUCHED);
    ensure(
        untouched_before == untouched_after,
        format!(
            "partition {} changed from {:?} to {:?}",
            UNTOUCHED, untouched_before, untouched_after
        ),
    )
}

/// `--to-datetime` previews and applies a reset to a point between two batches
pub async fn reset_offsets_by_timestamp(ctx: ScenarioContext) -> ScenarioResult {
    let topic = ctx.create_topic("cg_reset_timestamp", 2).await?;
    let group = ctx.group_for(&topic);
    ctx.seed(&topic, &numbered("early_message", 3)).await?;
    ctx.pause(ctx.config().timestamp_gap, "a clean timestamp boundary").await;
    let boundary = Utc::now().timestamp_millis();
    ctx.seed(&topic, &numbered("late_message", 3)).await?;
    ctx.consume_committing(&topic, &group, 6).await?;

    ctx.enter(Phase::Exercise);
    let preview = ResetRequest::new(group.as_str(), topic.as_str(), ResetTarget::Datetime(boundary));
    let dry_run = ctx.cli().reset_offsets(&preview).await;
    let executed = ctx.cli().reset_offsets(&preview.clone().execute()).await;

    ctx.enter(Phase::Verify);
    expect_step(&dry_run, "dry run by timestamp failed")?;
    ensure(
        dry_run.result.stdout_contains(markers::RESET_BY_TIMESTAMP)
            && dry_run.result.stdout_contains(markers::RESET_DATETIME),
        with_result(&format!("dry run did not describe timestamp {}", boundary), &dry_run.result),
    )?;
    expect_step(&executed, "reset by timestamp failed")
}

/// Deleting a group refuses while a consumer is connected and works once it left
pub async fn delete_group_with_active_member(ctx: ScenarioContext) -> ScenarioResult {
    let topic = ctx.create_topic("delete_active", 1).await?;
    let group = ctx.group_for(&topic);
    ctx.seed(&topic, &numbered("msg", 3)).await?;

    ctx.enter(Phase::Exercise);
    let mut member = ctx.cli().consume_in_background(topic.as_str(), group.as_str()).await?;
    ctx.pause(ctx.config().member_join_wait, "the consumer to join").await;
    let member_alive = member.is_running();
    let refused = ctx.cli().delete_group(group.as_str()).await;

    member.stop(ctx.config().background_grace).await?;
    ctx.pause(ctx.config().member_leave_wait, "the consumer to leave").await;
    let retried = ctx.cli().delete_group(group.as_str()).await;
    if retried.passed() {
        ctx.cleanup().forget(&TrackedResource::ConsumerGroup(group.to_string()));
    }

    ctx.enter(Phase::Verify);
    if !member_alive {
        let (_, stderr) = member.collect_output().await?;
        return Err(ScenarioError::Failed(format!(
            "background consumer exited before the delete (exit {:?}): {}",
            member.exit_code(),
            stderr.lines().next().unwrap_or("<no stderr>")
        )));
    }
    expect_rejected(
        &refused.result,
        markers::ACTIVE_MEMBER,
        "deleting a group with a live member was not refused with an active-member error",
    )?;
    ensure(
        retried.passed() || !retried.result.output_contains_ignore_case(markers::ACTIVE_MEMBER),
        with_result("group still reported active members after the consumer stopped", &retried.result),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarnessConfig;
    use crate::runtime::{BackgroundHandle, CommandInvocation, CommandResult, MockCommandRunner};
    use crate::scenarios::{Scenario, ScenarioRunner};
    use crate::testing::Verdict;
    use assert_matches::assert_matches;
    use futures_util::FutureExt;
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    /// One topic and one group, tracked well enough to answer describe and reset
    #[derive(Default)]
    struct Cluster {
        topic: String,
        partitions: i32,
        log_end: BTreeMap<i32, i64>,
        committed: BTreeMap<i32, i64>,
        produced: usize,
        // Misbehaviours
        dry_run_mutates: bool,
        ignore_partition_filter: bool,
        refuse_deletes: usize,
        // Observations
        group_deletes: usize,
        reset_calls: Vec<Vec<String>>,
    }

    fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == name)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    impl Cluster {
        fn answer(&mut self, inv: &CommandInvocation) -> CommandResult {
            let args = inv.args();
            match (args[0].as_str(), args.get(3).map(String::as_str)) {
                ("topics", Some("create")) => {
                    self.topic = flag(args, "--topic").unwrap_or_default().to_string();
                    self.partitions = flag(args, "--partitions").and_then(|p| p.parse().ok()).unwrap_or(1);
                    CommandResult::new(0, format!("Topic '{}' created successfully\n", self.topic), "")
                }
                ("topics", Some("list")) => CommandResult::new(0, format!("Topics:\n  {}\n", self.topic), ""),
                ("topics", Some("delete")) => CommandResult::new(0, "", ""),
                ("produce", _) => {
                    for _ in inv.input().unwrap_or_default().lines() {
                        let partition = (self.produced as i32) % self.partitions;
                        *self.log_end.entry(partition).or_default() += 1;
                        self.produced += 1;
                    }
                    CommandResult::new(0, "", "")
                }
                ("consume", _) => {
                    self.committed = self.log_end.clone();
                    CommandResult::new(0, "msg\n".repeat(self.produced), "")
                }
                ("consumer-groups", Some("describe")) => self.describe(flag(args, "--group").unwrap_or_default()),
                ("consumer-groups", Some("reset-offsets")) => self.reset(args),
                ("consumer-groups", Some("delete")) => {
                    self.group_deletes += 1;
                    if self.refuse_deletes > 0 {
                        self.refuse_deletes -= 1;
                        CommandResult::new(1, "", "Error: Cannot delete group: it still has active members")
                    } else {
                        CommandResult::new(0, "Deleted consumer group\n", "")
                    }
                }
                _ => CommandResult::new(2, "", "unexpected call"),
            }
        }

        fn describe(&self, group: &str) -> CommandResult {
            let mut out = format!("Consumer Group: {}\n  State: Empty\n  Members: 0\n\n", group);
            if self.committed.is_empty() {
                out.push_str("  No committed offsets found\n");
            } else {
                out.push_str("  Offsets:\n    TOPIC  PARTITION  CURRENT-OFFSET  LOG-END-OFFSET  LAG\n");
                for (partition, offset) in &self.committed {
                    let end = self.log_end.get(partition).copied().unwrap_or(0);
                    out.push_str(&format!(
                        "    {}  {}  {}  {}  {}\n",
                        self.topic,
                        partition,
                        offset,
                        end,
                        end - offset
                    ));
                }
            }
            CommandResult::new(0, out, "")
        }

        fn reset(&mut self, args: &[String]) -> CommandResult {
            self.reset_calls.push(args.to_vec());
            let execute = args.iter().any(|a| a == "--execute");
            let filter: Option<Vec<i32>> = flag(args, "--partitions")
                .map(|list| list.split(',').filter_map(|p| p.parse().ok()).collect());

            let mut out = String::new();
            if !execute {
                out.push_str("DRY RUN - no changes will be applied\n");
            }
            if let Some(millis) = flag(args, "--to-datetime") {
                out.push_str(&format!("  By timestamp\n  DateTime: {}\n", millis));
            }
            if let Some(partitions) = &filter {
                out.push_str(&format!("  Filtering partitions: {:?}\n", partitions));
            }

            if execute || self.dry_run_mutates {
                let targeted = if self.ignore_partition_filter { None } else { filter };
                for (partition, offset) in self.committed.iter_mut() {
                    if targeted.as_ref().is_none_or(|t| t.contains(partition)) {
                        *offset = 0;
                    }
                }
            }
            if execute {
                out.push_str("Successfully reset offsets\n");
            }
            CommandResult::new(0, out, "")
        }
    }

    fn runner_for(cluster: Cluster) -> (ScenarioRunner, Arc<Mutex<Cluster>>) {
        let cluster = Arc::new(Mutex::new(cluster));
        let state = cluster.clone();
        let mut runner = MockCommandRunner::new();
        runner
            .expect_run()
            .returning(move |inv| state.lock().unwrap().answer(&inv));
        runner.expect_spawn_background().returning(|_args| {
            BackgroundHandle::spawn(Path::new("sh"), &["-c".to_string(), "exec sleep 30".to_string()])
        });
        let config = HarnessConfig::builder().name_prefix("unit").without_waits().build();
        (ScenarioRunner::new(config, Arc::new(runner)), cluster)
    }

    #[test]
    fn test_numbered_records() {
        assert_eq!(numbered("msg", 3), vec!["msg_0", "msg_1", "msg_2"]);
        assert!(numbered("msg", 0).is_empty());
    }

    #[tokio::test]
    async fn test_consumer_group_describe_passes() {
        let (runner, _) = runner_for(Cluster::default());
        let verdict = runner
            .run(&Scenario::new("describe", |ctx| consumer_group_describe(ctx).boxed()))
            .await;
        assert_eq!(verdict, Verdict::Pass);
    }

    #[tokio::test]
    async fn test_dry_run_then_execute_rewinds_offsets() {
        let (runner, cluster) = runner_for(Cluster::default());
        let verdict = runner
            .run(&Scenario::new("reset", |ctx| reset_offsets_dry_run_then_execute(ctx).boxed()))
            .await;

        assert_eq!(verdict, Verdict::Pass);
        let cluster = cluster.lock().unwrap();
        assert_eq!(cluster.reset_calls.len(), 2);
        assert!(cluster.committed.values().all(|offset| *offset == 0));
    }

    #[tokio::test]
    async fn test_dry_run_that_moves_offsets_fails() {
        let (runner, _) = runner_for(Cluster {
            dry_run_mutates: true,
            ..Cluster::default()
        });
        let verdict = runner
            .run(&Scenario::new("reset", |ctx| reset_offsets_dry_run_then_execute(ctx).boxed()))
            .await;
        assert_matches!(verdict, Verdict::Fail(reason) if reason.contains("dry run changed committed offsets"));
    }

    #[tokio::test]
    async fn test_partition_filter_leaves_other_partitions_alone() {
        let (runner, cluster) = runner_for(Cluster::default());
        let verdict = runner
            .run(&Scenario::new("filter", |ctx| reset_offsets_partition_filter(ctx).boxed()))
            .await;

        assert_eq!(verdict, Verdict::Pass);
        let cluster = cluster.lock().unwrap();
        assert_eq!(flag(&cluster.reset_calls[0], "--partitions"), Some("0,1"));
        assert_eq!(cluster.committed.get(&0), Some(&0));
        assert_eq!(cluster.committed.get(&2), Some(&3));
    }

    #[tokio::test]
    async fn test_partition_filter_ignored_by_cli_fails() {
        let (runner, _) = runner_for(Cluster {
            ignore_partition_filter: true,
            ..Cluster::default()
        });
        let verdict = runner
            .run(&Scenario::new("filter", |ctx| reset_offsets_partition_filter(ctx).boxed()))
            .await;
        assert_matches!(verdict, Verdict::Fail(reason) if reason.starts_with("partition 2 changed"));
    }

    #[tokio::test]
    async fn test_reset_by_timestamp_sends_datetime() {
        let (runner, cluster) = runner_for(Cluster::default());
        let verdict = runner
            .run(&Scenario::new("timestamp", |ctx| reset_offsets_by_timestamp(ctx).boxed()))
            .await;

        assert_eq!(verdict, Verdict::Pass);
        let cluster = cluster.lock().unwrap();
        let millis: i64 = flag(&cluster.reset_calls[0], "--to-datetime").unwrap().parse().unwrap();
        assert!(millis > 0);
        assert!(cluster.reset_calls[1].contains(&"--execute".to_string()));
    }

    #[tokio::test]
    async fn test_delete_refused_while_member_active_then_allowed() {
        let (runner, cluster) = runner_for(Cluster {
            refuse_deletes: 1,
            ..Cluster::default()
        });
        let verdict = runner
            .run(&Scenario::new("active", |ctx| delete_group_with_active_member(ctx).boxed()))
            .await;

        assert_eq!(verdict, Verdict::Pass);
        // Refused, then accepted; the retry removed it so cleanup skips the group
        assert_eq!(cluster.lock().unwrap().group_deletes, 2);
    }

    #[tokio::test]
    async fn test_delete_accepted_with_active_member_fails() {
        let (runner, _) = runner_for(Cluster::default());
        let verdict = runner
            .run(&Scenario::new("active", |ctx| delete_group_with_active_member(ctx).boxed()))
            .await;
        assert_matches!(verdict, Verdict::Fail(reason) if reason.contains("was not refused"));
    }
}
