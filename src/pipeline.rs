//! End-to-end orchestration
//!
//! source file -> problem locator -> samples -> language -> build and run
//! -> verification -> report

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::compiler::{compile_and_run, StepLimits};
use crate::config::AppConfig;
use crate::common::{Outcome, PipelineError};
use crate::languages::{resolve, LanguageTable, ResolvedCommand};
use crate::locator::{extract_locator, ProblemLocator};
use crate::report::{classify_diagnostic, VerificationReport, NO_ERRORS};
use crate::runner::{ExecutionResult, RunPhase, Runner};
use crate::samples::{SampleFetcher, SampleSet};
use crate::verifier;

pub struct Pipeline<'a> {
    config: AppConfig,
    fetcher: SampleFetcher,
    table: &'a LanguageTable,
    runner: Arc<dyn Runner>,
    limits: StepLimits,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: AppConfig,
        fetcher: SampleFetcher,
        table: &'a LanguageTable,
        runner: Arc<dyn Runner>,
    ) -> Self {
        let limits = StepLimits::new(config.compile_timeout, config.run_timeout);
        Self {
            config,
            fetcher,
            table,
            runner,
            limits,
        }
    }

    /// Verify `path` against the sample tests of the problem it links to
    pub async fn run_samples(&self, path: &Path) -> Result<VerificationReport, PipelineError> {
        let text = read_source(path).await?;
        let locator = extract_locator(&text, &self.config.site)?;
        info!(
            "Problem {}/{} ({})",
            locator.contest_id, locator.problem_letter, locator.canonical_url
        );

        let samples = self.fetcher.fetch(&locator).await?;
        info!("Fetched {} sample test(s)", samples.len());

        let resolved = resolve(path, self.table, self.config.isolate_runs)?;
        let input = samples.joined_input();
        let result = self.execute(&resolved, &input).await?;

        let report = build_report(Some(locator), &resolved.language, input, result, Some(&samples));
        if report.outcome == Outcome::Failed {
            warn!("Output does not match the expected output");
        }
        Ok(report)
    }

    /// Build and run `path` on user-provided input, without verification
    pub async fn run_custom(
        &self,
        path: &Path,
        input: &str,
    ) -> Result<VerificationReport, PipelineError> {
        // Only checks that the file is readable; custom runs need no problem URL
        read_source(path).await?;

        let resolved = resolve(path, self.table, self.config.isolate_runs)?;
        let result = self.execute(&resolved, input).await?;

        Ok(build_report(None, &resolved.language, input.to_string(), result, None))
    }

    async fn execute(
        &self,
        resolved: &ResolvedCommand,
        input: &str,
    ) -> Result<ExecutionResult, PipelineError> {
        Ok(compile_and_run(resolved, input, self.runner.as_ref(), &self.limits).await?)
    }
}

async fn read_source(path: &Path) -> Result<String, PipelineError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| PipelineError::Io {
            path: path.display().to_string(),
            source,
        })
}

fn build_report(
    locator: Option<ProblemLocator>,
    language: &str,
    user_input: String,
    result: ExecutionResult,
    samples: Option<&SampleSet>,
) -> VerificationReport {
    // A timeout is reported as such whichever step it hit
    let outcome = if result.timed_out {
        Outcome::TimedOut
    } else if result.phase == RunPhase::Compile {
        Outcome::CompileError
    } else if result.exit_error.is_some() {
        Outcome::RuntimeError
    } else {
        match samples {
            Some(samples) if verifier::verify(samples, &result.stdout) => Outcome::Passed,
            Some(_) => Outcome::Failed,
            None => Outcome::Executed,
        }
    };

    let diagnostic = describe(&result, outcome);
    // A failed compile produced nothing worth showing
    let user_output = match result.phase {
        RunPhase::Compile => String::new(),
        RunPhase::Execute => result.stdout,
    };

    VerificationReport {
        locator,
        language: language.to_string(),
        user_input,
        user_output,
        expected_output: samples.map(SampleSet::joined_output),
        diagnostic,
        passed: outcome == Outcome::Passed,
        outcome,
        elapsed_ms: result.elapsed_ms,
    }
}

fn describe(result: &ExecutionResult, outcome: Outcome) -> String {
    let diagnostic = classify_diagnostic(&result.stderr);
    if diagnostic != NO_ERRORS || !outcome.is_error() {
        return diagnostic;
    }

    if result.timed_out {
        let step = match result.phase {
            RunPhase::Compile => "Compilation",
            RunPhase::Execute => "Execution",
        };
        format!("{} timed out after {}ms", step, result.elapsed_ms)
    } else {
        result
            .exit_error
            .clone()
            .unwrap_or_else(|| NO_ERRORS.to_string())
    }
}
