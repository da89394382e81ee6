//! Background Process Controller
//!
//! Keeps a long-running CLI process (e.g. an open-ended consumer) alive while
//! the scenario issues other calls, then shuts it down in two phases:
//! SIGTERM with a grace period, SIGKILL if it is still around.

use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use shared::{HarnessError, HarnessResult};

/// How long `collect_output` waits for the pipes to close after the process
/// ended; a grandchild may still hold them open
const READER_DRAIN_LIMIT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    Terminated,
}

/// Ownership of one live external process and its output buffers
#[derive(Debug)]
pub struct BackgroundHandle {
    label: String,
    child: Option<Child>,
    stdout_reader: Option<OutputReader>,
    stderr_reader: Option<OutputReader>,
    state: ProcessState,
    exit_code: Option<i32>,
}

impl BackgroundHandle {
    /// Spawn `program args...` with stdout/stderr drained into memory
    pub fn spawn(program: &Path, args: &[String]) -> HarnessResult<Self> {
        let label = format!("{} {}", program.display(), args.first().map(String::as_str).unwrap_or(""))
            .trim()
            .to_string();

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| HarnessError::Spawn {
                program: program.display().to_string(),
                message: e.to_string(),
            })?;

        // Reader tasks keep the pipes empty so the child never blocks on output
        let stdout_reader = child.stdout.take().map(drain);
        let stderr_reader = child.stderr.take().map(drain);

        tracing::info!("🚀 Started background process '{}' (PID: {:?})", label, child.id());

        Ok(Self {
            label,
            child: Some(child),
            stdout_reader,
            stderr_reader,
            state: ProcessState::Running,
            exit_code: None,
        })
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Exit code once terminated; None while running or when killed by a signal
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Check if the process is still running, noticing a natural exit
    pub fn is_running(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!("🏁 Background process '{}' exited on its own: {}", self.label, status);
                self.mark_terminated(status.code());
                false
            }
            Ok(None) => true,
            Err(e) => {
                tracing::warn!("⚠️ Error checking '{}' status: {}", self.label, e);
                true
            }
        }
    }

    /// Graceful termination, escalating to a forced kill after `grace`
    pub async fn stop(&mut self, grace: Duration) -> HarnessResult<()> {
        let Some(child) = self.child.as_mut() else {
            return Ok(());
        };

        tracing::info!("🛑 Stopping background process '{}'", self.label);

        #[cfg(unix)]
        {
            if let Err(e) = terminate_gracefully(child) {
                tracing::warn!("⚠️ Failed to send SIGTERM to '{}': {}", self.label, e);
            }
        }
        #[cfg(not(unix))]
        {
            let _ = child.start_kill();
        }

        let status = match timeout(grace, child.wait()).await {
            Ok(status) => {
                tracing::info!("✅ '{}' terminated gracefully", self.label);
                status?
            }
            Err(_) => {
                tracing::warn!("🔨 '{}' ignored SIGTERM for {:?}, force killing", self.label, grace);
                child.kill().await?;
                child.wait().await?
            }
        };

        self.mark_terminated(status.code());
        Ok(())
    }

    /// Captured (stdout, stderr); only available after termination
    pub async fn collect_output(&mut self) -> HarnessResult<(String, String)> {
        if self.is_running() {
            return Err(HarnessError::StillRunning {
                label: self.label.clone(),
            });
        }

        let stdout = join_reader(&self.label, self.stdout_reader.take(), READER_DRAIN_LIMIT).await;
        let stderr = join_reader(&self.label, self.stderr_reader.take(), READER_DRAIN_LIMIT).await;
        Ok((
            String::from_utf8_lossy(&stdout).into_owned(),
            String::from_utf8_lossy(&stderr).into_owned(),
        ))
    }

    fn mark_terminated(&mut self, exit_code: Option<i32>) {
        self.state = ProcessState::Terminated;
        self.exit_code = exit_code;
        self.child = None;
    }
}

impl Drop for BackgroundHandle {
    fn drop(&mut self) {
        // Emergency cleanup - force kill a process nobody stopped
        if let Some(mut child) = self.child.take() {
            tracing::warn!("🚨 Emergency cleanup: force killing '{}'", self.label);
            let _ = child.start_kill();
        }
    }
}

/// Pipe drain task and the bytes it has read so far
#[derive(Debug)]
struct OutputReader {
    task: JoinHandle<()>,
    buf: Arc<Mutex<Vec<u8>>>,
}

impl OutputReader {
    fn take_bytes(&self) -> Vec<u8> {
        std::mem::take(&mut *self.buf.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }
}

fn drain<R>(mut stream: R) -> OutputReader
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let buf = Arc::new(Mutex::new(Vec::new()));
    let sink = buf.clone();
    let task = tokio::spawn(async move {
        let mut chunk = [0u8; 4096];
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => sink
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .extend_from_slice(&chunk[..n]),
            }
        }
    });
    OutputReader { task, buf }
}

/// Wait up to `limit` for EOF, then keep whatever was read
async fn join_reader(label: &str, reader: Option<OutputReader>, limit: Duration) -> Vec<u8> {
    let Some(mut reader) = reader else {
        return Vec::new();
    };
    if timeout(limit, &mut reader.task).await.is_err() {
        tracing::warn!("⏰ Output pipe of '{}' still open after {:?}, keeping partial output", label, limit);
        reader.task.abort();
    }
    reader.take_bytes()
}

#[cfg(unix)]
fn terminate_gracefully(child: &Child) -> nix::Result<()> {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    match child.id() {
        Some(pid) => signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM),
        // Already reaped
        None => Ok(()),
    }
}
