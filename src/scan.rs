//! Scan event
//!
//! One completed, valid input line: the scanned identifier plus
//! the instant the terminating key was observed.

use chrono::{DateTime, Local, SecondsFormat};

/// A captured scan (immutable once constructed)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    id: u64,
    timestamp: DateTime<Local>,
}

impl Scan {
    /// Create a scan stamped with the current time
    pub fn now(id: u64) -> Self {
        Self::at(id, Local::now())
    }

    /// Create a scan with an explicit capture time
    pub fn at(id: u64, timestamp: DateTime<Local>) -> Self {
        Self { id, timestamp }
    }

    /// Scanned identifier
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Capture time
    #[allow(dead_code)]
    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Timestamp in the encoding every sink records
    ///
    /// RFC 3339, millisecond precision, numeric UTC offset
    /// (e.g. `2026-10-16T09:30:12.345+02:00`).
    pub fn timestamp_string(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, false)
    }
}

/// Parse one assembled line into an identifier
///
/// Leading/trailing whitespace and carriage control is trimmed.
/// Anything that is not an unsigned decimal fitting in 64 bits yields None.
pub fn parse_id(line: &str) -> Option<u64> {
    let trimmed = line.trim_matches(|c: char| matches!(c, '\n' | '\r' | ' ' | '\t'));
    // u64::from_str accepts a leading '+'
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};

    #[test]
    fn test_parse_id_plain() {
        assert_eq!(parse_id("12345"), Some(12345));
        assert_eq!(parse_id("0"), Some(0));
        assert_eq!(parse_id("0042"), Some(42));
    }

    #[test]
    fn test_parse_id_trims_line_noise() {
        assert_eq!(parse_id("12345\n"), Some(12345));
        assert_eq!(parse_id("\r\n 987\t\r\n"), Some(987));
    }

    #[test]
    fn test_parse_id_rejects_malformed() {
        assert_eq!(parse_id(""), None);
        assert_eq!(parse_id("\n"), None);
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("12 34"), None);
        assert_eq!(parse_id("+12"), None);
        assert_eq!(parse_id("-12"), None);
        assert_eq!(parse_id("12a"), None);
    }

    #[test]
    fn test_parse_id_64bit_bounds() {
        assert_eq!(parse_id("18446744073709551615"), Some(u64::MAX));
        assert_eq!(parse_id("18446744073709551616"), None);
        assert_eq!(parse_id("99999999999999999999999"), None);
    }

    #[test]
    fn test_timestamp_string_is_rfc3339_millis() {
        let ts = Local.with_ymd_and_hms(2026, 10, 16, 9, 30, 12).unwrap();
        let scan = Scan::at(7, ts);
        let s = scan.timestamp_string();
        assert!(s.starts_with("2026-10-16T09:30:12.000"));
        let parsed = DateTime::parse_from_rfc3339(&s).unwrap();
        assert_eq!(parsed, ts);
    }
}
