//! Runner module - Execution abstraction layer
//!
//! This module provides a unified interface for running programs:
//! - `LocalRunner`: spawns the toolchain or solution directly with a hard
//!   wall-clock timeout
//! - `RunArtifacts`: guard that removes a run's temp files on every exit path
//!
//! The runner module does NOT:
//! - Compare outputs or determine outcomes
//! - Know about languages or problems

pub mod artifacts;
pub mod local;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Command specification for execution
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    /// Program path or name
    pub program: String,
    /// Arguments to the program
    pub args: Vec<String>,
    /// Working directory
    pub work_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn with_work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.work_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Create from a command vector (first element is program, rest are args)
    pub fn from_vec(cmd: &[String]) -> Self {
        let mut iter = cmd.iter();
        let program = iter.next().cloned().unwrap_or_default();
        let args: Vec<String> = iter.cloned().collect();
        Self {
            program,
            args,
            work_dir: None,
        }
    }

    /// Convert to a vector of strings (program + args)
    pub fn to_vec(&self) -> Vec<String> {
        let mut v = vec![self.program.clone()];
        v.extend(self.args.clone());
        v
    }
}

/// Limits for a single execution
#[derive(Debug, Clone)]
pub struct RunLimits {
    /// Wall-clock timeout
    pub timeout: Duration,
}

impl RunLimits {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

/// Stream redirection for execution
#[derive(Debug, Default, Clone)]
pub struct IoSpec {
    /// File fed to stdin (null device when absent)
    pub stdin_path: Option<PathBuf>,
    /// File receiving stdout (captured in memory when absent)
    pub stdout_path: Option<PathBuf>,
    /// Inherit the caller's terminal instead of capturing
    pub inherit: bool,
}

impl IoSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stdin(mut self, path: impl AsRef<Path>) -> Self {
        self.stdin_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_stdout(mut self, path: impl AsRef<Path>) -> Self {
        self.stdout_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn inherited() -> Self {
        Self {
            inherit: true,
            ..Self::default()
        }
    }
}

/// Which step produced an execution result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Compile,
    #[default]
    Execute,
}

/// Outcome of running a program (raw, no verdict interpretation)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionResult {
    /// Stdout content
    pub stdout: String,
    /// Stderr content
    pub stderr: String,
    /// Killed after exceeding the wall-clock timeout
    pub timed_out: bool,
    /// Non-success exit description, e.g. "exit status 1"
    pub exit_error: Option<String>,
    /// Wall time in milliseconds
    pub elapsed_ms: u64,
    pub phase: RunPhase,
}

impl ExecutionResult {
    /// Exited normally with status 0 before the timeout
    pub fn is_success(&self) -> bool {
        !self.timed_out && self.exit_error.is_none()
    }
}

/// Runner trait for executing programs
#[async_trait]
pub trait Runner: Send + Sync {
    /// Run a command with the given limits and stream redirection
    async fn run(&self, cmd: &CommandSpec, limits: &RunLimits, io: &IoSpec)
        -> Result<ExecutionResult>;
}

// Re-exports
pub use artifacts::RunArtifacts;
pub use local::LocalRunner;
