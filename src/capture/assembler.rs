//! Line assembly
//!
//! Accumulates decoded symbols until the terminator arrives,
//! then turns the line into a Scan (or silently drops it).

use log::debug;

use crate::scan::{parse_id, Scan};

/// Symbol that ends a scan line
pub const TERMINATOR: char = '\n';

/// One decoded input symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// Nothing to forward (key release, repeat, unmapped key)
    Null,
    /// Character to append (the terminator included)
    Char(char),
}

/// Accumulator for the line currently being scanned
#[derive(Debug, Default)]
pub struct LineAssembler {
    line: String,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one symbol
    ///
    /// Returns a Scan when the symbol terminates a line that parses
    /// as an unsigned 64-bit decimal. The accumulator is reset after
    /// every terminator, valid or not.
    pub fn push(&mut self, symbol: Symbol) -> Option<Scan> {
        let c = match symbol {
            Symbol::Null => return None,
            Symbol::Char(c) => c,
        };
        self.line.push(c);
        if c != TERMINATOR {
            return None;
        }

        let scan = match parse_id(&self.line) {
            Some(id) => Some(Scan::now(id)),
            None => {
                debug!("Dropping malformed line: {:?}", self.line.trim_end());
                None
            }
        };
        self.line.clear();
        scan
    }

    /// Characters accumulated since the last terminator
    #[allow(dead_code)]
    pub fn pending(&self) -> &str {
        &self.line
    }
}
