//! Durable local log
//!
//! Appends `<id>, <timestamp>\n` to a flat text file. The file is opened
//! per write in append mode. This is the only guaranteed record, so
//! any failure is fatal.

use log::debug;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use super::{FailurePolicy, Sink, SinkError};
use crate::scan::Scan;

/// Append-only scan log
pub struct LocalLogSink {
    path: PathBuf,
}

impl LocalLogSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Format one log line
pub fn format_line(scan: &Scan) -> String {
    format!("{}, {}\n", scan.id(), scan.timestamp_string())
}

impl Sink for LocalLogSink {
    fn name(&self) -> &str {
        "local-log"
    }

    fn record(&mut self, scan: &Scan) -> Result<(), SinkError> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        // Single write so concurrent appenders never interleave a line
        file.write_all(format_line(scan).as_bytes())?;
        debug!("Appended scan {} to {}", scan.id(), self.path.display());
        Ok(())
    }

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Fatal
    }
}
