//! Remote ledger: Google Sheets
//!
//! Appends one `(id, timestamp)` row per scan to a fixed range via the
//! `spreadsheets.values.append` REST call. Best effort: the local log
//! already holds the authoritative copy.

use log::debug;
use serde_json::json;

use super::token::TokenProvider;
use super::{expect_ok, http_agent, Sink, SinkError};
use crate::config::SheetsConfig;
use crate::scan::Scan;

/// Sheets row-append sink
pub struct SheetsSink {
    agent: ureq::Agent,
    url: String,
    value_input_option: String,
    token: Box<dyn TokenProvider>,
}

impl SheetsSink {
    pub fn new(config: &SheetsConfig, token: Box<dyn TokenProvider>) -> Self {
        Self {
            agent: http_agent(config.timeout_secs),
            url: append_url(&config.endpoint, &config.sheet_id, &config.range),
            value_input_option: config.value_input_option.clone(),
            token,
        }
    }
}

/// `{endpoint}/v4/spreadsheets/{id}/values/{range}:append`
pub fn append_url(endpoint: &str, sheet_id: &str, range: &str) -> String {
    format!(
        "{}/v4/spreadsheets/{}/values/{}:append",
        endpoint.trim_end_matches('/'),
        urlencoding::encode(sheet_id),
        urlencoding::encode(range)
    )
}

/// ValueRange body holding a single row
pub fn row_body(scan: &Scan) -> serde_json::Value {
    json!({
        "majorDimension": "ROWS",
        "values": [[scan.id().to_string(), scan.timestamp_string()]],
    })
}

impl Sink for SheetsSink {
    fn name(&self) -> &str {
        "sheets"
    }

    fn record(&mut self, scan: &Scan) -> Result<(), SinkError> {
        let token = self.token.access_token()?;
        let response = self
            .agent
            .post(&self.url)
            .query("valueInputOption", &self.value_input_option)
            .set("Authorization", &format!("Bearer {}", token))
            .set("Content-Type", "application/json")
            .send_string(&row_body(scan).to_string())?;
        expect_ok(response)?;
        debug!("Appended scan {} to sheet", scan.id());
        Ok(())
    }
}
