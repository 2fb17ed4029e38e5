//! Compiler module - Build and run orchestration
//!
//! Composes the compile step (when the language has one) and the run step
//! for a resolved source file:
//! - writes the input file beside the source
//! - compiles with the compile timeout; a failed compile stops here
//! - runs with stdin from the input file and stdout into the result file
//!
//! All temp artifacts are owned by a `RunArtifacts` guard for the duration
//! of the call.

use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::time::Duration;
use tracing::{debug, info};

use crate::languages::ResolvedCommand;
use crate::runner::{ExecutionResult, IoSpec, RunArtifacts, RunLimits, RunPhase, Runner};

/// Timeouts for the two steps of a run
#[derive(Debug, Clone)]
pub struct StepLimits {
    pub compile: RunLimits,
    pub run: RunLimits,
}

impl StepLimits {
    pub fn new(compile_timeout: Duration, run_timeout: Duration) -> Self {
        Self {
            compile: RunLimits::new(compile_timeout),
            run: RunLimits::new(run_timeout),
        }
    }
}

impl Default for StepLimits {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), Duration::from_secs(10))
    }
}

/// Compile (if needed) and run `resolved` against `input`
///
/// A compile failure or compile timeout is returned as a result with
/// `phase == RunPhase::Compile`; the run step is skipped.
pub async fn compile_and_run(
    resolved: &ResolvedCommand,
    input: &str,
    runner: &dyn Runner,
    limits: &StepLimits,
) -> Result<ExecutionResult> {
    let paths = &resolved.paths;
    let _artifacts = RunArtifacts::new(paths, resolved.compile.is_some());

    tokio::fs::write(&paths.input, input)
        .await
        .with_context(|| format!("Failed to write input file {:?}", paths.input))?;
    debug!("Input written to {:?}", paths.input);

    if let Some(compile) = &resolved.compile {
        info!("Compiling {} source {:?}", resolved.language, paths.source);
        let mut result = runner
            .run(compile, &limits.compile, &IoSpec::new())
            .await
            .context("Failed to run compiler")?;
        result.phase = RunPhase::Compile;

        if !result.is_success() {
            info!(
                "Compilation failed (timed_out={}, exit_error={:?})",
                result.timed_out, result.exit_error
            );
            return Ok(result);
        }
    }

    let io = IoSpec::new()
        .with_stdin(&paths.input)
        .with_stdout(&paths.result);
    let mut result = runner
        .run(&resolved.run, &limits.run, &io)
        .await
        .context("Failed to run solution")?;
    result.phase = RunPhase::Execute;

    // Stdout went to the result file; whatever was written before a crash or kill is kept
    result.stdout = match tokio::fs::read_to_string(&paths.result).await {
        Ok(output) => output,
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read output {:?}", paths.result))
        }
    };

    info!(
        "Solution finished in {}ms (timed_out={}, exit_error={:?})",
        result.elapsed_ms, result.timed_out, result.exit_error
    );
    Ok(result)
}
