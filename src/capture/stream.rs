//! Generic line mode
//!
//! Reads newline-terminated text from any buffered reader (stdin by default).
//! End of stream or a read error ends capture.

use std::collections::VecDeque;
use std::io::BufRead;

use super::{CaptureError, Symbol, SymbolSource};

/// Line-buffered text input
pub struct LineStream<R> {
    reader: R,
    /// Characters of the current line not yet handed out
    pending: VecDeque<char>,
    buf: Vec<u8>,
    name: String,
}

impl<R: BufRead> LineStream<R> {
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
            buf: Vec::new(),
            name: name.into(),
        }
    }
}

impl LineStream<std::io::StdinLock<'static>> {
    /// Line stream over this process's stdin
    pub fn stdin() -> Self {
        Self::new(std::io::stdin().lock(), "stdin")
    }
}

impl<R: BufRead> SymbolSource for LineStream<R> {
    fn next_symbol(&mut self) -> Result<Symbol, CaptureError> {
        if let Some(c) = self.pending.pop_front() {
            return Ok(Symbol::Char(c));
        }

        self.buf.clear();
        let n = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .map_err(CaptureError::Read)?;
        if n == 0 {
            return Err(CaptureError::Exhausted);
        }

        // Invalid UTF-8 becomes U+FFFD and fails to parse downstream
        self.pending
            .extend(String::from_utf8_lossy(&self.buf).chars());
        Ok(self
            .pending
            .pop_front()
            .map(Symbol::Char)
            .unwrap_or(Symbol::Null))
    }

    fn describe(&self) -> String {
        format!("line stream ({})", self.name)
    }
}
