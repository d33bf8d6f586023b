//! Scan dispatcher
//!
//! One worker thread drains the scan queue and applies every sink
//! to each scan, in a fixed order, before taking the next one.
//! A best-effort sink failure is logged and the scan still counts as
//! delivered; a fatal sink failure stops the worker immediately.

pub mod queue;

use log::{error, info, warn};
use std::thread::JoinHandle;
use thiserror::Error;

use crate::scan::Scan;
use crate::sinks::{FailurePolicy, Sink, SinkError};

pub use queue::{scan_queue, ScanReceiver};

/// Called on the dispatcher thread when a fatal error stops it
pub type FatalHook = Box<dyn FnOnce(&DispatchError) + Send>;

/// Dispatcher failure
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("sink {sink} failed for scan {id}: {source}")]
    Fatal {
        sink: String,
        id: u64,
        #[source]
        source: SinkError,
    },
    #[error("cannot start dispatcher thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("dispatcher thread panicked")]
    Panicked,
}

/// Counters reported when the dispatcher exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Scans taken off the queue and fully dispatched
    pub scans: u64,
    /// Best-effort sink failures swallowed along the way
    pub sink_failures: u64,
}

/// Applies sinks to scans
pub struct Dispatcher {
    sinks: Vec<Box<dyn Sink>>,
    stats: DispatchStats,
}

impl Dispatcher {
    /// Sinks run in the order given
    pub fn new(sinks: Vec<Box<dyn Sink>>) -> Self {
        Self {
            sinks,
            stats: DispatchStats::default(),
        }
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Apply every sink to one scan
    ///
    /// Stops at the first fatal failure without trying later sinks.
    pub fn dispatch(&mut self, scan: &Scan) -> Result<(), DispatchError> {
        info!("New scan: {} at {}", scan.id(), scan.timestamp_string());

        for sink in self.sinks.iter_mut() {
            if let Err(e) = sink.record(scan) {
                match sink.failure_policy() {
                    FailurePolicy::Fatal => {
                        return Err(DispatchError::Fatal {
                            sink: sink.name().to_string(),
                            id: scan.id(),
                            source: e,
                        });
                    }
                    FailurePolicy::BestEffort => {
                        warn!("{}: unable to record scan {}: {}", sink.name(), scan.id(), e);
                        self.stats.sink_failures += 1;
                    }
                }
            }
        }

        self.stats.scans += 1;
        Ok(())
    }

    /// Drain the queue until it is closed and empty
    pub fn run(mut self, rx: ScanReceiver) -> Result<DispatchStats, DispatchError> {
        while let Some(scan) = rx.recv() {
            self.dispatch(&scan)?;
        }
        info!(
            "Dispatcher finished: {} scans, {} sink failures",
            self.stats.scans, self.stats.sink_failures
        );
        Ok(self.stats)
    }

    /// Run on a dedicated thread
    ///
    /// `on_fatal` runs on that thread before it exits with a fatal error,
    /// while the capture loop may still be blocked on input.
    pub fn spawn(
        self,
        rx: ScanReceiver,
        on_fatal: Option<FatalHook>,
    ) -> Result<DispatcherHandle, DispatchError> {
        let thread = std::thread::Builder::new()
            .name("scanlog-dispatch".into())
            .spawn(move || {
                let result = self.run(rx);
                if let Err(e) = &result {
                    error!("Dispatcher stopped: {}", e);
                    if let Some(hook) = on_fatal {
                        hook(e);
                    }
                }
                result
            })
            .map_err(DispatchError::Spawn)?;
        Ok(DispatcherHandle { thread })
    }
}

/// Joinable dispatcher thread
pub struct DispatcherHandle {
    thread: JoinHandle<Result<DispatchStats, DispatchError>>,
}

impl DispatcherHandle {
    /// Wait for the dispatcher to drain the queue and exit
    pub fn join(self) -> Result<DispatchStats, DispatchError> {
        self.thread.join().map_err(|_| DispatchError::Panicked)?
    }
}
