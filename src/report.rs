//! Writes the scaling-factor table to a diagnostic sink, one line per message.

use std::io::{self, Write};

use clap::ValueEnum;
use tracing::debug;

use crate::scaling::FactorTable;

/// Target carrying diagnostic lines. The subscriber always enables it at debug level.
pub const DIAG_TARGET: &str = "turbojpeg_harness::diag";

/// Developer-facing output channel. Each call is one complete, flushed line.
pub trait DiagnosticSink {
    fn line(&mut self, message: &str);
}

/// Sends each line as a `tracing` debug event.
#[derive(Debug, Default)]
pub struct TraceSink;

impl DiagnosticSink for TraceSink {
    fn line(&mut self, message: &str) {
        debug!(target: DIAG_TARGET, "{}", message);
    }
}

/// Writes each line to stderr and flushes it immediately.
#[derive(Debug, Default)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn line(&mut self, message: &str) {
        let mut stderr = io::stderr().lock();
        // Diagnostics are best effort; a closed stderr is not a failure of the report.
        let _ = writeln!(stderr, "{}", message);
        let _ = stderr.flush();
    }
}

impl DiagnosticSink for Vec<String> {
    fn line(&mut self, message: &str) {
        self.push(message.to_string());
    }
}

/// Sink selection on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SinkKind {
    /// Debug events through the log subscriber
    Trace,
    /// Plain lines on stderr
    Stderr,
}

impl SinkKind {
    pub fn open(self) -> Box<dyn DiagnosticSink> {
        match self {
            SinkKind::Trace => Box::new(TraceSink),
            SinkKind::Stderr => Box::new(StderrSink),
        }
    }
}

/// Reports every scaling factor in `table`: a count header, then one line per factor in
/// library order. Values are printed as the library returned them.
pub fn report_scaling_factors(table: &impl FactorTable, sink: &mut dyn DiagnosticSink) {
    let factors = table.scaling_factors();

    sink.line(&format!("Got {} scaling factors", factors.len()));
    for (i, factor) in factors.iter().enumerate() {
        sink.line(&format!(
            "Scaling factor {} is {}/{}",
            i, factor.num, factor.denom
        ));
    }
}
