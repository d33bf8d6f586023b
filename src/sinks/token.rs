//! Access token capability for the Sheets sink
//!
//! Token acquisition and refresh happen outside scanlog; it only reads
//! the cached OAuth token file an authorization helper maintains.

use serde::Deserialize;
use std::path::PathBuf;

use super::SinkError;

/// Supplies a bearer token per request
pub trait TokenProvider: Send {
    fn access_token(&self) -> Result<String, SinkError>;
}

/// Cached OAuth token JSON (`token.json`)
#[derive(Debug, Deserialize)]
struct CachedToken {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
}

/// Reads `access_token` from a token file on every call,
/// so an external refresher can rewrite it underneath us
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenProvider for TokenFile {
    fn access_token(&self) -> Result<String, SinkError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            SinkError::Credentials(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        let token: CachedToken = serde_json::from_str(&content).map_err(|e| {
            SinkError::Credentials(format!("cannot parse {}: {}", self.path.display(), e))
        })?;
        if let Some(kind) = &token.token_type {
            if !kind.eq_ignore_ascii_case("bearer") {
                return Err(SinkError::Credentials(format!(
                    "unsupported token type {:?}",
                    kind
                )));
            }
        }
        if token.access_token.is_empty() {
            return Err(SinkError::Credentials("empty access token".to_string()));
        }
        Ok(token.access_token)
    }
}

/// Fixed token
#[cfg(test)]
pub struct StaticToken(pub String);

#[cfg(test)]
impl TokenProvider for StaticToken {
    fn access_token(&self) -> Result<String, SinkError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_access_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(
            &path,
            r#"{"access_token":"ya29.abc","token_type":"Bearer","refresh_token":"r","expiry":"2026-10-16T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(TokenFile::new(&path).access_token().unwrap(), "ya29.abc");
    }

    #[test]
    fn test_missing_file_is_credentials_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = TokenFile::new(dir.path().join("token.json")).access_token();
        assert!(matches!(result, Err(SinkError::Credentials(_))));
    }

    #[test]
    fn test_rejects_empty_or_unknown_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");

        std::fs::write(&path, r#"{"access_token":""}"#).unwrap();
        assert!(TokenFile::new(&path).access_token().is_err());

        std::fs::write(&path, r#"{"access_token":"x","token_type":"MAC"}"#).unwrap();
        assert!(TokenFile::new(&path).access_token().is_err());
    }
}
