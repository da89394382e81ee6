//! Top-level flags that need no cluster

use super::runner::{Phase, ScenarioContext};
use crate::testing::{expect_step, ScenarioResult};

/// `--help` describes the tool and advertises its main subcommands
pub async fn help_command(ctx: ScenarioContext) -> ScenarioResult {
    ctx.enter(Phase::Exercise);
    let step = ctx.cli().help().await;

    ctx.enter(Phase::Verify);
    expect_step(&step, "help output lacks the description or a subcommand")
}

/// `--version` names the binary
pub async fn version_command(ctx: ScenarioContext) -> ScenarioResult {
    ctx.enter(Phase::Exercise);
    let step = ctx.cli().version().await;

    ctx.enter(Phase::Verify);
    expect_step(&step, "version output does not name the binary")?;
    tracing::info!("📋 Version: {}", step.result.stdout.trim());
    Ok(())
}
