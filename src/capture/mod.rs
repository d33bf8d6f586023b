//! Capture source
//!
//! Turns a raw input surface into a lazy sequence of Scans.
//! - Generic line mode: newline-terminated text (stdin)
//! - Device mode: evdev key events from an exclusively grabbed reader
//!
//! Both modes decode into `Symbol`s and share one `LineAssembler`.

pub mod assembler;
pub mod device;
pub mod keycodes;
pub mod stream;

use log::{error, info};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::{CaptureConfig, CaptureMode};
use crate::constants::INPUT_DEVICE_DIR;
use crate::scan::Scan;

pub use assembler::{LineAssembler, Symbol, TERMINATOR};
pub use device::DeviceSource;
pub use stream::LineStream;

/// Why capture stopped (or could not start)
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("input stream reached end of file")]
    Exhausted,
    #[error("input read failed: {0}")]
    Read(#[source] std::io::Error),
    #[error("short read from input device ({got} of {expected} bytes)")]
    ShortRead { got: usize, expected: usize },
    #[error("cannot open input device {path:?}: {source}")]
    DeviceOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot grab input device {path:?} exclusively: {source}")]
    DeviceGrab {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },
    #[error("no input device named {0:?}")]
    DeviceNotFound(String),
}

/// Source of decoded input symbols
///
/// An error ends capture for good; there is no retry.
pub trait SymbolSource {
    /// Block until the next symbol is available
    fn next_symbol(&mut self) -> Result<Symbol, CaptureError>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

impl<S: SymbolSource + ?Sized> SymbolSource for Box<S> {
    fn next_symbol(&mut self) -> Result<Symbol, CaptureError> {
        (**self).next_symbol()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Open the input surface the config names
///
/// In device mode this takes the exclusive grab; failure is fatal.
pub fn open_source(config: &CaptureConfig) -> Result<Box<dyn SymbolSource>, CaptureError> {
    match config.mode {
        CaptureMode::Stdin => Ok(Box::new(LineStream::stdin())),
        CaptureMode::Device if !config.device_path.is_empty() => {
            Ok(Box::new(DeviceSource::open(Path::new(&config.device_path))?))
        }
        CaptureMode::Device => Ok(Box::new(DeviceSource::open_by_name(
            Path::new(INPUT_DEVICE_DIR),
            &config.device_name,
        )?)),
    }
}

/// Scan iterator over a symbol source
///
/// Yields every valid line as a Scan. Ends (and stays ended) once the
/// source reports an error; the reason is kept for `end_reason`.
pub struct Capture<S> {
    source: S,
    assembler: LineAssembler,
    end: Option<CaptureError>,
}

impl<S: SymbolSource> Capture<S> {
    pub fn new(source: S) -> Self {
        info!("Capturing from {}", source.describe());
        Self {
            source,
            assembler: LineAssembler::new(),
            end: None,
        }
    }

    /// Reason capture ended, if it has
    #[allow(dead_code)]
    pub fn end_reason(&self) -> Option<&CaptureError> {
        self.end.as_ref()
    }

    /// Consume the iterator, returning the end reason
    pub fn into_end_reason(self) -> Option<CaptureError> {
        self.end
    }
}

impl<S: SymbolSource> Iterator for Capture<S> {
    type Item = Scan;

    fn next(&mut self) -> Option<Scan> {
        if self.end.is_some() {
            return None;
        }
        loop {
            match self.source.next_symbol() {
                Ok(symbol) => {
                    if let Some(scan) = self.assembler.push(symbol) {
                        return Some(scan);
                    }
                }
                Err(CaptureError::Exhausted) => {
                    info!("Capture stopped: {} ended", self.source.describe());
                    self.end = Some(CaptureError::Exhausted);
                    return None;
                }
                Err(e) => {
                    error!("Capture stopped: {}", e);
                    self.end = Some(e);
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays a fixed symbol list, then fails with Exhausted
    struct Scripted(VecDeque<Symbol>);

    impl Scripted {
        fn new(symbols: &[Symbol]) -> Self {
            Self(symbols.iter().copied().collect())
        }
    }

    impl SymbolSource for Scripted {
        fn next_symbol(&mut self) -> Result<Symbol, CaptureError> {
            self.0.pop_front().ok_or(CaptureError::Exhausted)
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    #[test]
    fn test_capture_filters_nulls_and_ends_on_error() {
        let symbols = [
            Symbol::Char('1'),
            Symbol::Null,
            Symbol::Char('2'),
            Symbol::Char('\n'),
            Symbol::Char('x'),
            Symbol::Char('\n'),
            Symbol::Char('9'),
            Symbol::Char('\n'),
        ];
        let mut capture = Capture::new(Scripted::new(&symbols));
        let ids: Vec<u64> = capture.by_ref().map(|s| s.id()).collect();
        assert_eq!(ids, vec![12, 9]);
        assert!(matches!(capture.end_reason(), Some(CaptureError::Exhausted)));
        // Stays ended
        assert!(capture.next().is_none());
    }

    #[test]
    fn test_unterminated_tail_is_discarded() {
        let symbols = [Symbol::Char('5'), Symbol::Char('\n'), Symbol::Char('6')];
        let capture = Capture::new(Scripted::new(&symbols));
        let ids: Vec<u64> = capture.map(|s| s.id()).collect();
        assert_eq!(ids, vec![5]);
    }

    #[test]
    fn test_boxed_source() {
        let source: Box<dyn SymbolSource> =
            Box::new(Scripted::new(&[Symbol::Char('8'), Symbol::Char('\n')]));
        let mut capture = Capture::new(source);
        assert_eq!(capture.next().map(|s| s.id()), Some(8));
        assert!(capture.next().is_none());
    }
}
