//! Topic administration

use super::runner::{Phase, ScenarioContext};
use crate::runtime::TrackedResource;
use crate::testing::{ensure, expect_step, markers, with_result, ScenarioResult};

/// `topics list` succeeds against a live cluster
pub async fn topics_list(ctx: ScenarioContext) -> ScenarioResult {
    ctx.enter(Phase::Exercise);
    let step = ctx.cli().list_topics().await;

    ctx.enter(Phase::Verify);
    ensure(step.result.success(), with_result("topics list failed", &step.result))?;
    tracing::debug!("📋 {} topic(s) listed", step.check.len());
    Ok(())
}

/// Create, find, describe and delete one topic
pub async fn topic_lifecycle(ctx: ScenarioContext) -> ScenarioResult {
    let topic = ctx.create_topic("lifecycle", 3).await?;

    ctx.enter(Phase::Exercise);
    let listed = ctx.cli().list_topics().await;
    let described = ctx.cli().describe_topic(topic.as_str()).await;
    let deleted = ctx.cli().delete_topic(topic.as_str()).await;
    if deleted.passed() {
        ctx.cleanup().forget(&TrackedResource::Topic(topic.to_string()));
    }

    ctx.enter(Phase::Verify);
    ensure(
        listed.check.contains(topic.as_str()),
        with_result(&format!("topic '{}' not found in list", topic), &listed.result),
    )?;
    ensure(
        described.check.partitions == Some(3),
        with_result(&format!("describe did not report {}", markers::partition_count(3)), &described.result),
    )?;
    expect_step(&deleted, &format!("failed to delete topic '{}'", topic))
}

/// `topics describe` prints name, partition count, leader and replicas
pub async fn topic_describe(ctx: ScenarioContext) -> ScenarioResult {
    let topic = ctx.create_topic("describe", 5).await?;

    ctx.enter(Phase::Exercise);
    let step = ctx.cli().describe_topic(topic.as_str()).await;

    ctx.enter(Phase::Verify);
    ensure(step.result.success(), with_result("topics describe failed", &step.result))?;
    let missing = step.check.missing_fields(5);
    ensure(
        missing.is_empty(),
        format!("describe output is missing: {}", missing.join(", ")),
    )
}

/// Listing twice without changes yields the same set
pub async fn topics_list_idempotent(ctx: ScenarioContext) -> ScenarioResult {
    let topic = ctx.create_topic("idempotent", 1).await?;

    ctx.enter(Phase::Exercise);
    let first = ctx.cli().list_topics().await;
    let second = ctx.cli().list_topics().await;

    ctx.enter(Phase::Verify);
    ensure(first.result.success(), with_result("first topics list failed", &first.result))?;
    ensure(second.result.success(), with_result("second topics list failed", &second.result))?;
    ensure(
        first.check.contains(topic.as_str()),
        format!("topic '{}' not found in list", topic),
    )?;

    // Only our own topic is guaranteed stable on a shared cluster
    let ours = |names: &std::collections::BTreeSet<String>| {
        names
            .iter()
            .filter(|name| name.starts_with(ctx.names().run_prefix()))
            .cloned()
            .collect::<Vec<_>>()
    };
    ensure(
        ours(&first.check) == ours(&second.check),
        format!(
            "topic listings differ: {:?} vs {:?}",
            ours(&first.check),
            ours(&second.check)
        ),
    )
}
