//! Produce and consume round trip

use super::runner::{Phase, ScenarioContext};
use crate::testing::{ensure, expect_step, with_result, ConsumeRequest, ScenarioResult};

const KEY_SEPARATOR: &str = "\t";
const RECORDS: [(&str, &str); 3] = [("key1", "Hello Kafka"), ("key2", "Message 2"), ("key3", "Message 3")];

/// Keyed records piped into `produce` come back out of `consume`
pub async fn produce_and_consume(ctx: ScenarioContext) -> ScenarioResult {
    let topic = ctx.create_topic("messaging", 1).await?;
    let lines: Vec<String> = RECORDS
        .iter()
        .map(|(key, value)| format!("{}{}{}", key, KEY_SEPARATOR, value))
        .collect();

    ctx.enter(Phase::Exercise);
    let produced = ctx.cli().produce(topic.as_str(), &lines, Some(KEY_SEPARATOR)).await;
    expect_step(&produced, &format!("failed to produce to '{}'", topic))?;
    ctx.pause(ctx.config().settle_delay, "produced records").await;

    let request = ConsumeRequest::new(topic.as_str())
        .from_beginning()
        .max_messages(RECORDS.len());
    let consumed = ctx.cli().consume(&request).await;

    ctx.enter(Phase::Verify);
    expect_step(&consumed, "consume failed")?;
    let missing: Vec<&str> = RECORDS
        .iter()
        .map(|(_, value)| *value)
        .filter(|value| !consumed.result.stdout_contains(value))
        .collect();
    ensure(
        missing.is_empty(),
        with_result(&format!("consumed output lacks {:?}", missing), &consumed.result),
    )
}
