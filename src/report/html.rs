//! HTML report
//!
//! Input echo block on top, then actual and expected output side by side.
//! The output border is green when the run passed and red otherwise.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use super::{ReportSink, VerificationReport};
use crate::common::Outcome;

const STYLE: &str = r#"
body { font-family: Arial, sans-serif; padding: 10px; background: rgb(40, 40, 40); color: white; }
pre { background: rgb(28, 28, 28); padding: 10px; border-radius: 5px; white-space: pre-wrap; overflow-wrap: break-word; overflow: auto; }
#output { display: grid; grid-template-columns: 1fr 1fr; gap: 1px; min-width: 100%; }
.structure { border: 1px solid gray; border-radius: 10px; padding: 0 10px; margin-bottom: 10px; }
.passed { border-color: green; }
.failed { border-color: red; }
"#;

/// Writes the report as a standalone HTML document
#[derive(Debug, Clone)]
pub struct HtmlSink {
    path: PathBuf,
}

impl HtmlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn render(report: &VerificationReport) -> String {
        let mut body = String::new();

        if let Some((contest, problem)) = report.problem_header() {
            let _ = writeln!(
                body,
                "<p>Contest ID: {} <br />Problem ID: {}</p>",
                escape(&contest),
                escape(&problem)
            );
        }
        let _ = writeln!(
            body,
            "<h1 class=\"status {}\">{}</h1>",
            report.outcome,
            report.outcome.label()
        );
        let _ = writeln!(
            body,
            "<div class=\"structure\"><h2>Input</h2><pre>{}</pre></div>",
            escape(&report.user_input)
        );

        if !matches!(report.outcome, Outcome::CompileError | Outcome::TimedOut) {
            let border = match (report.outcome, report.passed) {
                (Outcome::Executed, _) => "",
                (_, true) => " passed",
                (_, false) => " failed",
            };
            let _ = writeln!(body, "<div class=\"structure{}\">", border);
            let _ = writeln!(body, "<h2>Output</h2><div id=\"output\">");
            let _ = writeln!(
                body,
                "<div><h3>User Output</h3><pre>{}</pre></div>",
                escape(&report.user_output)
            );
            if let Some(expected) = &report.expected_output {
                let _ = writeln!(
                    body,
                    "<div><h3>Expected Output</h3><pre>{}</pre></div>",
                    escape(expected)
                );
            }
            let _ = writeln!(body, "</div></div>");
        }

        if report.outcome.is_error() {
            let _ = writeln!(
                body,
                "<h2>Errors</h2><pre>{}</pre>",
                escape(&report.diagnostic)
            );
        }

        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
             <title>Test Cases Result</title>\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
            STYLE, body
        )
    }
}

impl ReportSink for HtmlSink {
    fn present(&self, report: &VerificationReport) -> Result<()> {
        std::fs::write(&self.path, Self::render(report))
            .with_context(|| format!("Failed to write HTML report {:?}", self.path))?;
        info!("HTML report written to {:?}", self.path);
        Ok(())
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_report;

    #[test]
    fn test_passed_report_has_green_panes() {
        let html = HtmlSink::render(&sample_report(Outcome::Passed));

        assert!(html.contains("<div class=\"structure passed\">"));
        assert!(html.contains("<h3>User Output</h3><pre>3\n</pre>"));
        assert!(html.contains("<h3>Expected Output</h3><pre>3\n</pre>"));
        assert!(html.contains("Contest ID: 1 <br />Problem ID: A"));
        assert!(!html.contains("<h2>Errors</h2>"));
    }

    #[test]
    fn test_failed_report_has_red_panes() {
        let mut report = sample_report(Outcome::Failed);
        report.user_output = "4\n".into();

        let html = HtmlSink::render(&report);
        assert!(html.contains("<div class=\"structure failed\">"));
        assert!(html.contains("<pre>4\n</pre>"));
        assert!(html.contains("<pre>3\n</pre>"));
    }

    #[test]
    fn test_compile_error_shows_errors_only() {
        let mut report = sample_report(Outcome::CompileError);
        report.diagnostic = "a.cpp:2:1: error: expected ';' before '}'\n}".into();

        let html = HtmlSink::render(&report);
        assert!(!html.contains("<h2>Output</h2>"));
        assert!(html.contains("<h2>Errors</h2><pre>a.cpp:2:1: error: expected &#39;;&#39; before &#39;}&#39;\n}</pre>"));
    }

    #[test]
    fn test_runtime_error_shows_partial_output_and_errors() {
        let mut report = sample_report(Outcome::RuntimeError);
        report.user_output = "partial\n".into();
        report.diagnostic = "exit status 139".into();

        let html = HtmlSink::render(&report);
        assert!(html.contains("<h3>User Output</h3><pre>partial\n</pre>"));
        assert!(html.contains("<div class=\"structure failed\">"));
        assert!(html.contains("<h2>Errors</h2><pre>exit status 139</pre>"));
    }

    #[test]
    fn test_output_is_escaped() {
        let mut report = sample_report(Outcome::Failed);
        report.user_output = "<script>alert(1)</script>".into();

        let html = HtmlSink::render(&report);
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_present_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");

        HtmlSink::new(&path)
            .present(&sample_report(Outcome::Passed))
            .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));
    }
}
