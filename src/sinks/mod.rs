//! Scan sinks
//!
//! Every destination a Scan is recorded to implements `Sink`.
//! The dispatcher applies sinks in a fixed order and uses each
//! sink's `FailurePolicy` to decide whether a failure is fatal.

pub mod local_log;
pub mod sheets;
pub mod token;
pub mod webhook;

use log::info;
use thiserror::Error;

use crate::config::Config;
use crate::scan::Scan;

pub use local_log::LocalLogSink;
pub use sheets::SheetsSink;
pub use token::TokenFile;
pub use webhook::WebhookSink;

/// What a sink failure means for the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Failure stops dispatching and terminates the process
    Fatal,
    /// Failure is logged and the scan counts as delivered
    BestEffort,
}

/// Sink failure
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP request failed: {0}")]
    Transport(String),
    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("remote rejected scan: {0}")]
    Rejected(String),
    #[error("credentials unavailable: {0}")]
    Credentials(String),
}

impl From<ureq::Error> for SinkError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(status, response) => SinkError::Status {
                status,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(t) => SinkError::Transport(t.to_string()),
        }
    }
}

/// A destination for scans
pub trait Sink: Send {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Record one scan
    fn record(&mut self, scan: &Scan) -> Result<(), SinkError>;

    /// How the dispatcher treats a failure of this sink
    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::BestEffort
    }
}

/// Build the enabled sinks in their fixed order:
/// local log, Sheets, webhook
pub fn from_config(config: &Config) -> anyhow::Result<Vec<Box<dyn Sink>>> {
    let mut sinks: Vec<Box<dyn Sink>> = Vec::new();

    if config.local_log.enabled {
        info!("Local log: {}", config.local_log.path);
        sinks.push(Box::new(LocalLogSink::new(&config.local_log.path)));
    }
    if config.sheets.enabled {
        info!(
            "Sheets: {} ({})",
            config.sheets.sheet_id, config.sheets.range
        );
        let token = TokenFile::new(&config.sheets.token_file);
        sinks.push(Box::new(SheetsSink::new(&config.sheets, Box::new(token))));
    }
    if config.webhook.enabled {
        info!("Webhook: {}", config.webhook.url);
        sinks.push(Box::new(WebhookSink::new(&config.webhook)?));
    }

    Ok(sinks)
}

/// Build a ureq agent with the given timeout
pub(crate) fn http_agent(timeout_secs: u64) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
}

/// Treat any non-200 response as a failure
pub(crate) fn expect_ok(response: ureq::Response) -> Result<ureq::Response, SinkError> {
    let status = response.status();
    if status == 200 {
        Ok(response)
    } else {
        Err(SinkError::Status {
            status,
            body: response.into_string().unwrap_or_default(),
        })
    }
}


#[cfg(test)]
pub(crate) mod test_server {
    //! Throwaway single-threaded HTTP server for sink tests

    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// A request the server received
    #[derive(Debug, Clone)]
    pub struct Captured {
        pub request_line: String,
        pub headers: Vec<(String, String)>,
        pub body: String,
    }

    impl Captured {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }
    }

    /// Serve `responses` in order, one per connection.
    /// Returns the base URL and a receiver of captured requests.
    pub fn start(responses: Vec<(u16, &'static str)>) -> (String, mpsc::Receiver<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
        let port = listener.local_addr().unwrap().port();
        let addr = format!("http://127.0.0.1:{}", port);
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for (status, body) in responses {
                let (stream, _) = match listener.accept() {
                    Ok(s) => s,
                    Err(_) => return,
                };
                let mut reader = BufReader::new(stream.try_clone().unwrap());

                let mut request_line = String::new();
                let _ = reader.read_line(&mut request_line);

                let mut headers = Vec::new();
                let mut content_length = 0usize;
                loop {
                    let mut line = String::new();
                    let _ = reader.read_line(&mut line);
                    if line == "\r\n" || line.is_empty() {
                        break;
                    }
                    if let Some((k, v)) = line.trim_end().split_once(':') {
                        let (k, v) = (k.trim().to_string(), v.trim().to_string());
                        if k.eq_ignore_ascii_case("content-length") {
                            content_length = v.parse().unwrap_or(0);
                        }
                        headers.push((k, v));
                    }
                }

                let mut body_buf = vec![0u8; content_length];
                let _ = reader.read_exact(&mut body_buf);

                let _ = tx.send(Captured {
                    request_line: request_line.trim_end().to_string(),
                    headers,
                    body: String::from_utf8_lossy(&body_buf).into_owned(),
                });

                let mut stream = stream;
                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });

        (addr, rx)
    }
}
