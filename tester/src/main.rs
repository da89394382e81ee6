//! Kafka CLI functional test runner
//!
//! Runs the scenario catalog (or one group / scenario of it) against a built
//! `kafka-cli` and a live cluster:
//! - Checks the CLI executable exists before touching the cluster
//! - Prints a line per scenario and a summary at the end
//! - Exits 0 only when every scenario passed

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use kcli_tester::config::harness::{DEFAULT_BOOTSTRAP_SERVER, DEFAULT_CLI_PATH, DEFAULT_PREFIX};
use kcli_tester::{CliProcess, HarnessConfig, OutputStyle, Reporter, ScenarioRunner, TestScenarios};
use shared::logging::{init_tracing, log_error, log_startup};

#[derive(Parser)]
#[command(name = "kcli-tester")]
#[command(about = "Functional test harness for the Kafka CLI")]
struct Args {
    /// Scenario, group, or `all`
    #[arg(long, default_value = "all")]
    scenario: String,

    /// Path to the kafka-cli executable under test
    #[arg(long, env = "KAFKA_CLI", default_value = DEFAULT_CLI_PATH)]
    cli_path: PathBuf,

    /// Bootstrap server the CLI connects to
    #[arg(long, env = "BOOTSTRAP_SERVER", default_value = DEFAULT_BOOTSTRAP_SERVER)]
    bootstrap_server: String,

    /// Prefix for topic and group names created by the run
    #[arg(long, env = "TEST_PREFIX", default_value = DEFAULT_PREFIX)]
    prefix: String,

    /// Timeout for a single CLI command in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Pause between scenarios in milliseconds
    #[arg(long, default_value = "500")]
    settle_ms: u64,

    /// Also write the run report as JSON to this file
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// List available scenarios and exit
    #[arg(long)]
    list: bool,

    /// Plain output without colors or emoji
    #[arg(long)]
    plain: bool,

    /// Enable verbose tracing output
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so clap's env fallbacks see it
    dotenv::dotenv().ok();
    let args = Args::parse();

    init_tracing(Some(if args.verbose { "debug" } else { "info" }));

    if args.list {
        for name in TestScenarios::available_scenarios() {
            println!("{}", name);
        }
        return Ok(());
    }

    let config = HarnessConfig::builder()
        .cli_path(args.cli_path.clone())
        .bootstrap_server(args.bootstrap_server.clone())
        .name_prefix(args.prefix.clone())
        .command_timeout(Duration::from_secs(args.timeout_secs))
        .settle_delay(Duration::from_millis(args.settle_ms))
        .plain_output(args.plain)
        .build();

    if let Err(e) = config.validate() {
        log_error("Pre-flight check", &e);
        if !config.cli_path.is_file() {
            eprintln!(
                "kafka-cli not found at {}; build it first with `cargo build --release` or pass --cli-path",
                config.cli_path.display()
            );
        }
        std::process::exit(1);
    }

    log_startup(&format!(
        "Kafka CLI functional tests: cli={}, bootstrap={}, scenario={}",
        config.cli_path.display(),
        config.bootstrap_server,
        args.scenario
    ));

    let reporter = Reporter::new(OutputStyle::detect(config.plain_output));
    let cli = Arc::new(CliProcess::new(config.cli_path.clone()));
    let suite = TestScenarios::new(ScenarioRunner::new(config, cli), reporter);

    let report = match suite.run_selection(&args.scenario).await {
        Ok(report) => report,
        Err(e) => {
            log_error("Scenario selection", &e);
            std::process::exit(1);
        }
    };

    print!("{}", reporter.summary(&report));

    if let Some(path) = &args.report_json {
        report
            .write_json(path)
            .with_context(|| format!("writing JSON report to {}", path.display()))?;
        tracing::info!("📄 Report written to {}", path.display());
    }

    std::process::exit(report.exit_status());
}
