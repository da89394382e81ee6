//! Common test utilities
//!
//! A scripted stand-in for kafka-cli so the suite can be driven through real
//! child processes without a cluster.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use kcli_tester::{CliProcess, HarnessConfig, OutputStyle, Reporter, ScenarioRunner, TestScenarios};
use tempfile::TempDir;

const FAKE_CLI: &str = include_str!("fake_cli.sh");

/// Executable script in its own temp dir; state lives next to it
pub struct FakeCli {
    dir: TempDir,
    path: PathBuf,
}

impl FakeCli {
    pub fn new() -> Self {
        Self::with_script(FAKE_CLI)
    }

    pub fn with_script(script: &str) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("kafka-cli");
        fs::write(&path, script).expect("write fake cli");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod fake cli");
        Self { dir, path }
    }

    /// Topics the fake cluster still holds
    pub fn remaining_topics(&self) -> Vec<String> {
        self.entries("topics")
    }

    /// Consumer groups the fake cluster still holds
    pub fn remaining_groups(&self) -> Vec<String> {
        self.entries("groups")
            .into_iter()
            .filter(|name| !name.ends_with(".active"))
            .collect()
    }

    fn entries(&self, kind: &str) -> Vec<String> {
        match fs::read_dir(self.dir.path().join(kind)) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn config(&self) -> HarnessConfig {
        HarnessConfig::builder()
            .cli_path(self.path.clone())
            .name_prefix("ittest")
            .command_timeout(Duration::from_secs(10))
            .consume_timeout(Duration::from_secs(5))
            .without_waits()
            // The scripted consumer needs a moment to register as a member
            .group_waits(Duration::ZERO, Duration::from_millis(500), Duration::ZERO)
            .background_grace(Duration::from_secs(3))
            .build()
    }

    pub fn suite(&self) -> TestScenarios {
        let config = self.config();
        let cli = Arc::new(CliProcess::new(config.cli_path.clone()));
        TestScenarios::new(ScenarioRunner::new(config, cli), Reporter::new(OutputStyle::Plain))
    }
}
