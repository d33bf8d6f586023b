//! Capture → queue → dispatcher wiring
//!
//! The capture loop runs on the calling thread and the dispatcher on its
//! own. When capture ends the queue is closed, the dispatcher drains what
//! is left, and `run` returns once it has been joined.

use log::{info, warn};

use crate::capture::{Capture, CaptureError, SymbolSource};
use crate::dispatch::{scan_queue, DispatchError, DispatchStats, Dispatcher, FatalHook};
use crate::sinks::Sink;

/// Outcome of a completed run
#[derive(Debug)]
pub struct PipelineReport {
    /// Scans handed to the queue
    pub captured: u64,
    /// What the dispatcher reported on exit
    pub dispatched: DispatchStats,
    /// Why capture stopped (None if the dispatcher went away first)
    pub capture_end: Option<CaptureError>,
}

/// Scan pipeline
pub struct Pipeline {
    dispatcher: Dispatcher,
    capacity: usize,
    on_fatal: Option<FatalHook>,
}

impl Pipeline {
    pub fn new(sinks: Vec<Box<dyn Sink>>, capacity: usize) -> Self {
        Self {
            dispatcher: Dispatcher::new(sinks),
            capacity,
            on_fatal: None,
        }
    }

    /// Run `hook` on the dispatcher thread if a fatal sink error stops it
    pub fn on_fatal(mut self, hook: FatalHook) -> Self {
        self.on_fatal = Some(hook);
        self
    }

    /// Capture until the source ends, then drain and join the dispatcher
    pub fn run<S: SymbolSource>(self, mut capture: Capture<S>) -> Result<PipelineReport, DispatchError> {
        info!(
            "Dispatching to sinks: [{}] (queue capacity {})",
            self.dispatcher.sink_names().join(", "),
            self.capacity
        );

        let (tx, rx) = scan_queue(self.capacity);
        let handle = self.dispatcher.spawn(rx, self.on_fatal)?;

        let mut captured = 0u64;
        for scan in capture.by_ref() {
            if let Err(scan) = tx.send(scan) {
                warn!("Dispatcher has stopped; scan {} not queued", scan.id());
                break;
            }
            captured += 1;
        }

        tx.close();
        let dispatched = handle.join()?;
        Ok(PipelineReport {
            captured,
            dispatched,
            capture_end: capture.into_end_reason(),
        })
    }
}
