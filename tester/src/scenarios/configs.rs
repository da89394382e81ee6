//! Topic configuration management

use super::runner::{Phase, ScenarioContext};
use crate::testing::{ensure, expect_step, markers, with_result, ScenarioResult};

const RETENTION_KEY: &str = "retention.ms";
const RETENTION_VALUE: &str = "86400000";

/// Describe a topic's configs, alter retention and read it back
pub async fn topic_configs(ctx: ScenarioContext) -> ScenarioResult {
    let topic = ctx.create_topic("configs", 1).await?;

    ctx.enter(Phase::Exercise);
    let described = ctx.cli().describe_configs(topic.as_str()).await;
    let entry = format!("{}={}", RETENTION_KEY, RETENTION_VALUE);
    let altered = ctx.cli().alter_config(topic.as_str(), &entry).await;
    let reread = ctx.cli().describe_configs(topic.as_str()).await;

    ctx.enter(Phase::Verify);
    expect_step(&described, "configs describe failed")?;
    expect_step(&altered, &format!("configs alter {} failed", entry))?;
    ensure(
        altered.result.stdout_contains(markers::CONFIGS_ALTERED),
        with_result("configs alter did not confirm the change", &altered.result),
    )?;
    expect_step(&reread, "configs describe after alter failed")?;
    ensure(
        reread
            .result
            .stdout_contains(&markers::config_entry(RETENTION_KEY, RETENTION_VALUE)),
        format!("{} is not {} after alter", RETENTION_KEY, RETENTION_VALUE),
    )
}
