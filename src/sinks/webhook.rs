//! Signed webhook sink
//!
//! POSTs scans as JSON to an HTTP endpoint (e.g. an Apps Script web app).
//! The body is signed with HMAC-SHA384 and the base64 signature travels
//! in the `signature` query parameter. The endpoint must answer 200
//! with the body `success`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use log::debug;
use serde_json::json;
use sha2::Sha384;

use super::{expect_ok, http_agent, Sink, SinkError};
use crate::config::WebhookConfig;
use crate::constants::WEBHOOK_SUCCESS_BODY;
use crate::scan::Scan;

type HmacSha384 = Hmac<Sha384>;

/// HMAC-signed JSON webhook
pub struct WebhookSink {
    agent: ureq::Agent,
    url: String,
    mac: HmacSha384,
    device_id: String,
}

impl WebhookSink {
    /// Create the sink; fails if `hmac_key` is not valid base64
    pub fn new(config: &WebhookConfig) -> anyhow::Result<Self> {
        let key = STANDARD
            .decode(config.hmac_key.trim())
            .map_err(|e| anyhow::anyhow!("webhook.hmac_key is not valid base64: {}", e))?;
        Ok(Self {
            agent: http_agent(config.timeout_secs),
            url: config.url.clone(),
            mac: signer(&key)?,
            device_id: config.device_id.clone(),
        })
    }

    /// JSON array with one scan object
    fn payload(&self, scan: &Scan) -> String {
        json!([{
            "scan_id": uuid::Uuid::new_v4().to_string(),
            "timestamp": scan.timestamp_string(),
            "card_number": scan.id().to_string(),
            "device_id": self.device_id,
        }])
        .to_string()
    }
}

/// Keyed HMAC-SHA384 state, cloned per message
pub fn signer(key: &[u8]) -> anyhow::Result<HmacSha384> {
    HmacSha384::new_from_slice(key).map_err(|e| anyhow::anyhow!("invalid HMAC key: {}", e))
}

/// base64(HMAC-SHA384(key, body))
pub fn sign(mac: &HmacSha384, body: &[u8]) -> String {
    let mut mac = mac.clone();
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}

impl Sink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    fn record(&mut self, scan: &Scan) -> Result<(), SinkError> {
        let body = self.payload(scan);
        let signature = sign(&self.mac, body.as_bytes());

        let response = self
            .agent
            .post(&self.url)
            .query("signature", &signature)
            .set("Content-Type", "application/json")
            .send_string(&body)?;
        let text = expect_ok(response)?.into_string()?;
        if text != WEBHOOK_SUCCESS_BODY {
            return Err(SinkError::Rejected(text));
        }
        debug!("Delivered scan {} to webhook", scan.id());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::test_server;
    use std::time::Duration;

    fn config(url: &str) -> WebhookConfig {
        WebhookConfig {
            enabled: true,
            url: url.to_string(),
            hmac_key: STANDARD.encode(b"secret-key"),
            device_id: "door-1".to_string(),
            timeout_secs: 2,
        }
    }

    #[test]
    fn test_sign_matches_rfc4231_case_2() {
        // RFC 4231 test case 2 (HMAC-SHA-384)
        let expected = "af45d2e376484031617f78d2b58a6b1b9c7ef464f5a01b47e42ec3736322445e8e2240ca5e69e2c78b3239ecfab21649";
        let mac = signer(b"Jefe").unwrap();
        let sig = STANDARD.decode(sign(&mac, b"what do ya want for nothing?")).unwrap();
        let hex: String = sig.iter().map(|b| format!("{:02x}", b)).collect();
        assert_eq!(hex, expected);
    }

    #[test]
    fn test_invalid_key_rejected() {
        let mut cfg = config("http://127.0.0.1:1/hook");
        cfg.hmac_key = "not base64!".to_string();
        assert!(WebhookSink::new(&cfg).is_err());
    }

    #[test]
    fn test_posts_signed_payload() {
        let (addr, requests) = test_server::start(vec![(200, "success")]);
        let mut sink = WebhookSink::new(&config(&format!("{}/exec", addr))).unwrap();

        let scan = Scan::now(4242);
        sink.record(&scan).unwrap();

        let req = requests.recv_timeout(Duration::from_secs(2)).unwrap();
        let body: serde_json::Value = serde_json::from_str(&req.body).unwrap();
        let entry = &body[0];
        assert_eq!(entry["card_number"], "4242");
        assert_eq!(entry["device_id"], "door-1");
        assert_eq!(entry["timestamp"], scan.timestamp_string());
        assert!(uuid::Uuid::parse_str(entry["scan_id"].as_str().unwrap()).is_ok());

        let expected = sign(&signer(b"secret-key").unwrap(), req.body.as_bytes());
        let expected = urlencoding::encode(&expected).into_owned();
        assert!(
            req.request_line
                .contains(&format!("/exec?signature={}", expected)),
            "{}",
            req.request_line
        );
    }

    #[test]
    fn test_non_success_body_is_rejection() {
        let (addr, _requests) = test_server::start(vec![(200, "bad signature")]);
        let mut sink = WebhookSink::new(&config(&addr)).unwrap();
        assert!(matches!(
            sink.record(&Scan::now(1)),
            Err(SinkError::Rejected(_))
        ));
    }

    #[test]
    fn test_success_body_must_match_exactly() {
        let (addr, _requests) =
            test_server::start(vec![(200, " success\n"), (200, "Success"), (200, "success")]);
        let mut sink = WebhookSink::new(&config(&addr)).unwrap();
        assert!(matches!(
            sink.record(&Scan::now(1)),
            Err(SinkError::Rejected(_))
        ));
        assert!(matches!(
            sink.record(&Scan::now(2)),
            Err(SinkError::Rejected(_))
        ));
        assert!(sink.record(&Scan::now(3)).is_ok());
    }
}
