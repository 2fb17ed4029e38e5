//! Plain-text report for the terminal

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;

use super::{ReportSink, VerificationReport};
use crate::common::Outcome;

/// Prints a human-readable summary to stdout
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }

    pub fn render(report: &VerificationReport) -> String {
        let mut out = String::new();

        if let Some((contest, problem)) = report.problem_header() {
            let _ = writeln!(out, "Contest ID: {}  Problem ID: {}", contest, problem);
        }
        let _ = writeln!(
            out,
            "[{}] {} ({}ms)",
            report.outcome.label(),
            summary(report.outcome),
            report.elapsed_ms
        );

        section(&mut out, "Input", &report.user_input);

        match report.outcome {
            Outcome::CompileError | Outcome::TimedOut => {}
            _ => {
                section(&mut out, "User Output", &report.user_output);
                if let Some(expected) = &report.expected_output {
                    section(&mut out, "Expected Output", expected);
                }
            }
        }

        if report.outcome.is_error() {
            section(&mut out, "Errors", &report.diagnostic);
        }

        out
    }
}

fn summary(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Passed => "All test cases passed!",
        Outcome::Failed => "Some test cases failed!",
        Outcome::CompileError => "Compilation failed",
        Outcome::RuntimeError => "Program exited with an error",
        Outcome::TimedOut => "Time limit exceeded",
        Outcome::Executed => "Program finished",
    }
}

fn section(out: &mut String, title: &str, body: &str) {
    let _ = writeln!(out, "--- {} ---", title);
    let _ = write!(out, "{}", body);
    if !body.ends_with('\n') {
        out.push('\n');
    }
}

impl ReportSink for ConsoleSink {
    fn present(&self, report: &VerificationReport) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(Self::render(report).as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_report;

    #[test]
    fn test_passed_report() {
        let text = ConsoleSink::render(&sample_report(Outcome::Passed));

        assert!(text.starts_with("Contest ID: 1  Problem ID: A\n[PASSED]"));
        assert!(text.contains("--- User Output ---\n3\n"));
        assert!(text.contains("--- Expected Output ---\n3\n"));
        assert!(!text.contains("--- Errors ---"));
    }

    #[test]
    fn test_compile_error_hides_panes() {
        let mut report = sample_report(Outcome::CompileError);
        report.user_output.clear();
        report.diagnostic = "a.cpp:1:1: error: x\nint x".into();

        let text = ConsoleSink::render(&report);
        assert!(text.contains("[COMPILE ERROR]"));
        assert!(!text.contains("--- Expected Output ---"));
        assert!(text.contains("--- Errors ---\na.cpp:1:1: error: x\nint x\n"));
    }

    #[test]
    fn test_runtime_error_keeps_partial_output() {
        let mut report = sample_report(Outcome::RuntimeError);
        report.user_output = "partial".into();

        let text = ConsoleSink::render(&report);
        assert!(text.contains("--- User Output ---\npartial\n"));
        assert!(text.contains("--- Errors ---"));
    }
}
