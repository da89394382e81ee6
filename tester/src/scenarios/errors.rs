//! Error reporting of the CLI

use super::runner::{Phase, ScenarioContext};
use crate::testing::{ensure, markers, with_result, ScenarioResult};

/// An unreachable bootstrap server makes the CLI exit non-zero with an error
pub async fn invalid_bootstrap_server(ctx: ScenarioContext) -> ScenarioResult {
    let cli = ctx.cli().with_bootstrap_server(ctx.config().invalid_bootstrap_server.clone());

    ctx.enter(Phase::Exercise);
    let step = cli.list_topics().await;

    ctx.enter(Phase::Verify);
    ensure(
        !step.result.success(),
        format!("topics list against '{}' succeeded", cli.bootstrap_server()),
    )?;
    ensure(
        step.result.output_contains(markers::ERROR) || step.result.output_contains(markers::FAILED),
        with_result("failure carried no error message", &step.result),
    )
}
