//! Report rendering
//!
//! A `VerificationReport` is the single user-facing result of a run. Sinks
//! render it to the terminal, to an HTML document, or to JSON.

pub mod console;
pub mod html;
pub mod json;

use anyhow::Result;
use serde::Serialize;

use crate::common::Outcome;
use crate::locator::ProblemLocator;

pub use console::ConsoleSink;
pub use html::HtmlSink;
pub use json::JsonSink;

pub const NO_ERRORS: &str = "No errors detected.";

/// Everything the user needs to judge a run
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    /// Absent for custom-input runs
    pub locator: Option<ProblemLocator>,
    pub language: String,
    pub user_input: String,
    pub user_output: String,
    /// Absent for custom-input runs
    pub expected_output: Option<String>,
    pub diagnostic: String,
    pub outcome: Outcome,
    pub passed: bool,
    pub elapsed_ms: u64,
}

impl VerificationReport {
    /// Contest and problem ids for display; hidden when the contest id is not numeric
    pub fn problem_header(&self) -> Option<(String, String)> {
        self.locator
            .as_ref()
            .filter(|locator| locator.has_numeric_contest())
            .map(|locator| (locator.contest_id.clone(), locator.problem_letter.clone()))
    }
}

/// Destination for a finished report
pub trait ReportSink {
    fn present(&self, report: &VerificationReport) -> Result<()>;
}

/// Presents a report through every contained sink in order
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn ReportSink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl ReportSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl ReportSink for MultiSink {
    fn present(&self, report: &VerificationReport) -> Result<()> {
        for sink in &self.sinks {
            sink.present(report)?;
        }
        Ok(())
    }
}

/// Reduce a diagnostic stream to its first real error and the line after it
pub fn classify_diagnostic(stderr: &str) -> String {
    if stderr.trim().is_empty() {
        return NO_ERRORS.to_string();
    }

    let lines: Vec<&str> = stderr.lines().collect();
    let error_index = lines
        .iter()
        .position(|line| line.contains("error") && !line.contains("note:"));

    match error_index {
        Some(idx) => {
            let main_error = lines[idx].trim();
            // Usually the offending source line
            let snippet = lines.get(idx + 1).map(|l| l.trim()).unwrap_or("");
            format!("{}\n{}", main_error, snippet)
        }
        None => stderr.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_report(outcome: Outcome) -> VerificationReport {
        VerificationReport {
            locator: Some(ProblemLocator {
                contest_id: "1".into(),
                problem_letter: "A".into(),
                canonical_url: "https://codeforces.com/contest/1/problem/A".into(),
            }),
            language: "cpp".into(),
            user_input: "1 2\n".into(),
            user_output: "3\n".into(),
            expected_output: Some("3\n".into()),
            diagnostic: NO_ERRORS.into(),
            outcome,
            passed: outcome == Outcome::Passed,
            elapsed_ms: 12,
        }
    }

    #[test]
    fn test_classify_empty() {
        assert_eq!(classify_diagnostic(""), NO_ERRORS);
        assert_eq!(classify_diagnostic("\n  \n"), NO_ERRORS);
    }

    #[test]
    fn test_classify_compiler_error() {
        let stderr = "sol.cpp: In function 'int main()':\n\
                      sol.cpp:4:5: error: 'x' was not declared in this scope\n\
                      \x20   4 |     x = 1;\n\
                      \x20     |     ^\n";
        assert_eq!(
            classify_diagnostic(stderr),
            "sol.cpp:4:5: error: 'x' was not declared in this scope\n4 |     x = 1;"
        );
    }

    #[test]
    fn test_classify_skips_note_lines() {
        let stderr = "note: error limit reached\nmain.rs:1:1: error: boom\n  code\n";
        assert_eq!(classify_diagnostic(stderr), "main.rs:1:1: error: boom\ncode");
    }

    #[test]
    fn test_classify_error_on_last_line() {
        assert_eq!(classify_diagnostic("fatal error: no input"), "fatal error: no input\n");
    }

    #[test]
    fn test_classify_falls_back_to_raw_stream() {
        let stderr = "Traceback (most recent call last):\nZeroDivisionError: division by zero\n";
        // "Error" is capitalized, so the raw stream is shown
        assert_eq!(classify_diagnostic(stderr), stderr);
    }

    #[test]
    fn test_problem_header_hidden_for_unknown_contest() {
        let mut report = sample_report(Outcome::Passed);
        assert_eq!(report.problem_header(), Some(("1".into(), "A".into())));

        report.locator.as_mut().unwrap().contest_id = "problem".into();
        assert_eq!(report.problem_header(), None);

        report.locator = None;
        assert_eq!(report.problem_header(), None);
    }
}
