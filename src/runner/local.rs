//! Local runner implementation
//!
//! Spawns programs directly on the host. Each captured child gets its own
//! process group so a timeout kills everything it started, not just the
//! immediate child.

use anyhow::{Context, Result};
use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::fs::File;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{CommandSpec, ExecutionResult, IoSpec, RunLimits, Runner};

/// Minimum time allowed for collecting output after the process group is gone
const STREAM_GRACE: Duration = Duration::from_millis(100);

/// Runner that executes programs directly with a wall-clock timeout
#[derive(Debug, Default, Clone)]
pub struct LocalRunner;

impl LocalRunner {
    pub fn new() -> Self {
        Self
    }

    fn build_command(&self, cmd: &CommandSpec, io: &IoSpec) -> Result<Command> {
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args).kill_on_drop(true);

        if let Some(dir) = &cmd.work_dir {
            command.current_dir(dir);
        }

        if io.inherit {
            // Stays in the caller's process group so it can read from the terminal
            command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
            return Ok(command);
        }

        let stdin = match &io.stdin_path {
            Some(path) => Stdio::from(
                File::open(path).with_context(|| format!("Failed to open input {:?}", path))?,
            ),
            None => Stdio::null(),
        };
        let stdout = match &io.stdout_path {
            Some(path) => Stdio::from(
                File::create(path).with_context(|| format!("Failed to create result {:?}", path))?,
            ),
            None => Stdio::piped(),
        };
        command
            .stdin(stdin)
            .stdout(stdout)
            .stderr(Stdio::piped())
            .process_group(0);

        Ok(command)
    }
}

#[async_trait]
impl Runner for LocalRunner {
    async fn run(
        &self,
        cmd: &CommandSpec,
        limits: &RunLimits,
        io: &IoSpec,
    ) -> Result<ExecutionResult> {
        debug!("Running {:?} with timeout {:?}", cmd.to_vec(), limits.timeout);

        let mut command = self.build_command(cmd, io)?;
        let started = Instant::now();
        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to spawn {}", cmd.program))?;
        let pid = child.id();

        let mut stdout_task = child.stdout.take().map(collect_stream);
        let mut stderr_task = child.stderr.take().map(collect_stream);

        let status = match tokio::time::timeout(limits.timeout, child.wait()).await {
            Ok(status) => Some(status.context("Failed to wait for child process")?),
            Err(_) => {
                warn!(
                    "{} exceeded {}ms, killing process group",
                    cmd.program,
                    limits.timeout.as_millis()
                );
                None
            }
        };

        // Background processes left in the group would hold the pipes open
        if !io.inherit {
            if let Some(pid) = pid {
                kill_group(pid);
            }
        }
        if status.is_none() {
            // Reap the child; kill() is a no-op if it is already gone
            let _ = child.kill().await;
        }

        // The deadline covers draining the streams too
        let remaining = limits
            .timeout
            .saturating_sub(started.elapsed())
            .max(STREAM_GRACE);
        let drained = tokio::time::timeout(remaining, async {
            let stdout = join_stream(stdout_task.as_mut()).await;
            let stderr = join_stream(stderr_task.as_mut()).await;
            (stdout, stderr)
        })
        .await;
        let (stdout, stderr, streams_closed) = match drained {
            Ok((stdout, stderr)) => (stdout, stderr, true),
            Err(_) => {
                warn!("{} output streams still open after the deadline", cmd.program);
                for task in stdout_task.iter().chain(stderr_task.iter()) {
                    task.abort();
                }
                (String::new(), String::new(), false)
            }
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let result = ExecutionResult {
            stdout,
            stderr,
            timed_out: status.is_none() || !streams_closed,
            exit_error: status
                .as_ref()
                .filter(|_| streams_closed)
                .and_then(describe_failure),
            elapsed_ms,
            ..Default::default()
        };

        debug!(
            "{} finished in {}ms (timed_out={}, exit_error={:?})",
            cmd.program, result.elapsed_ms, result.timed_out, result.exit_error
        );
        Ok(result)
    }
}

fn collect_stream<R>(mut reader: R) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Err(e) = reader.read_to_end(&mut buf).await {
            debug!("Stream read ended early: {}", e);
        }
        buf
    })
}

fn kill_group(pid: u32) {
    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) => {}
        // Nothing left in the group
        Err(Errno::ESRCH) => {}
        Err(e) => debug!("killpg({}) failed: {}", pid, e),
    }
}

async fn join_stream(task: Option<&mut JoinHandle<Vec<u8>>>) -> String {
    match task {
        Some(task) => match task.await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).to_string(),
            Err(e) => {
                warn!("Stream reader task failed: {}", e);
                String::new()
            }
        },
        None => String::new(),
    }
}

fn describe_failure(status: &ExitStatus) -> Option<String> {
    if status.success() {
        return None;
    }
    Some(match (status.code(), status.signal()) {
        (Some(code), _) => format!("exit status {}", code),
        (None, Some(signal)) => format!("terminated by signal {}", signal),
        (None, None) => "abnormal termination".to_string(),
    })
}
