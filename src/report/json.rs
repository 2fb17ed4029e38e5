//! JSON report for machine consumers (editor integrations, scripts)

use std::io::Write;

use anyhow::Result;

use super::{ReportSink, VerificationReport};

#[derive(Debug, Default)]
pub struct JsonSink;

impl JsonSink {
    pub fn new() -> Self {
        Self
    }
}

impl ReportSink for JsonSink {
    fn present(&self, report: &VerificationReport) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, report)?;
        writeln!(stdout)?;
        Ok(())
    }
}
