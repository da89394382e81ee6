//! Process Invoker
//!
//! Runs the CLI under test as a child process with optional piped input and a
//! hard timeout. Every outcome, including "could not start" and "timed out",
//! comes back as a [`CommandResult`]; callers branch on the exit code instead
//! of handling errors for expected failure paths.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use super::background::BackgroundHandle;
use shared::HarnessResult;

/// Exit code reserved for "timed out", "could not start" and "no exit code"
pub const SENTINEL_EXIT_CODE: i32 = -1;

/// Default timeout for a foreground call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One foreground call: argument vector, optional stdin payload, timeout
#[derive(Debug, Clone, PartialEq)]
pub struct CommandInvocation {
    args: Vec<String>,
    input: Option<String>,
    timeout: Duration,
}

impl CommandInvocation {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            input: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Text written to the child's stdin, which is closed afterwards
    pub fn with_input<S: Into<String>>(mut self, input: S) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn input(&self) -> Option<&str> {
        self.input.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// First argument token, used to label log lines
    pub fn subcommand(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or("<none>")
    }
}

/// Exit code plus captured output of one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Result for a call that never produced an exit status of its own
    pub fn invocation_failed(message: impl Into<String>) -> Self {
        Self::new(SENTINEL_EXIT_CODE, "", message)
    }

    pub fn timed_out_after(limit: Duration) -> Self {
        Self::invocation_failed(format!("Command timed out after {:?}", limit))
    }

    /// Check if the command succeeded (exit code 0)
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn timed_out(&self) -> bool {
        self.exit_code == SENTINEL_EXIT_CODE && self.stderr.starts_with("Command timed out")
    }

    pub fn stdout_contains(&self, pattern: &str) -> bool {
        self.stdout.contains(pattern)
    }

    pub fn stderr_contains(&self, pattern: &str) -> bool {
        self.stderr.contains(pattern)
    }

    /// Pattern appears in either stream
    pub fn output_contains(&self, pattern: &str) -> bool {
        self.stdout_contains(pattern) || self.stderr_contains(pattern)
    }

    pub fn output_contains_ignore_case(&self, pattern: &str) -> bool {
        let needle = pattern.to_lowercase();
        self.stdout.to_lowercase().contains(&needle) || self.stderr.to_lowercase().contains(&needle)
    }

    /// Short diagnostic for failure reasons: exit code and first stderr line
    pub fn brief(&self) -> String {
        let detail = self
            .stderr
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("<no stderr>");
        format!("exit_code={}, stderr: {}", self.exit_code, truncate(detail, 200))
    }

    fn from_output(output: std::process::Output) -> Self {
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let mut stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let exit_code = match output.status.code() {
            Some(code) => code,
            None => {
                if !stderr.is_empty() && !stderr.ends_with('\n') {
                    stderr.push('\n');
                }
                stderr.push_str(&format!("Process terminated without an exit code ({})", output.status));
                SENTINEL_EXIT_CODE
            }
        };
        Self {
            exit_code,
            stdout,
            stderr,
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}

/// Process boundary abstraction
///
/// Implemented by [`CliProcess`] for real runs and mocked in tests so that
/// scenario and runner logic can be exercised without the CLI or a cluster.
#[mockall::automock]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run one foreground call to completion or timeout
    async fn run(&self, invocation: CommandInvocation) -> CommandResult;

    /// Start a long-running call without waiting for it
    async fn spawn_background(&self, args: Vec<String>) -> HarnessResult<BackgroundHandle>;
}

/// Real runner bound to one executable
#[derive(Debug, Clone)]
pub struct CliProcess {
    program: PathBuf,
}

impl CliProcess {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl CommandRunner for CliProcess {
    async fn run(&self, invocation: CommandInvocation) -> CommandResult {
        let started = Instant::now();
        tracing::debug!(
            "▶️ {} {}",
            self.program.display(),
            invocation.args().join(" ")
        );

        let mut cmd = Command::new(&self.program);
        cmd.args(invocation.args())
            .stdin(if invocation.input().is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!("⚠️ Could not start {}: {}", self.program.display(), e);
                return CommandResult::invocation_failed(format!(
                    "Failed to start '{}': {}",
                    self.program.display(),
                    e
                ));
            }
        };

        let stdin = child.stdin.take();
        let input = invocation.input().map(str::to_owned);
        let feed = async move {
            if let (Some(mut stdin), Some(data)) = (stdin, input) {
                // A child that exits before reading everything closes the pipe; that is its business
                let _ = stdin.write_all(data.as_bytes()).await;
                let _ = stdin.shutdown().await;
            }
        };

        // The child moves into this future; dropping it on timeout kills the process
        let completion = async move {
            let (_, output) = tokio::join!(feed, child.wait_with_output());
            output
        };

        let result = match timeout(invocation.timeout(), completion).await {
            Ok(Ok(output)) => CommandResult::from_output(output),
            Ok(Err(e)) => CommandResult::invocation_failed(format!("Failed to collect output: {}", e)),
            Err(_) => {
                tracing::warn!(
                    "⏰ '{}' timed out after {:?}, child killed",
                    invocation.subcommand(),
                    invocation.timeout()
                );
                CommandResult::timed_out_after(invocation.timeout())
            }
        };

        tracing::debug!(
            "◀️ {} exited with {} in {:?}",
            invocation.subcommand(),
            result.exit_code,
            started.elapsed()
        );
        result
    }

    async fn spawn_background(&self, args: Vec<String>) -> HarnessResult<BackgroundHandle> {
        BackgroundHandle::spawn(&self.program, &args)
    }
}
