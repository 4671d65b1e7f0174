//! Shared HTTP client wrapper
//!
//! Thin wrapper around `reqwest::blocking::Client` that centralizes
//! USER_AGENT and timeout configuration, and maps non-2xx responses to
//! `AppError::Api` with the backend's `detail` message when one is present.

use crate::config::network::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS, USER_AGENT};
use crate::error::{AppError, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Shared HTTP client with standard configuration
pub struct HttpClient {
    inner: reqwest::blocking::Client,
}

impl HttpClient {
    /// Create a new client with default abfahrt settings
    pub fn new() -> Result<Self> {
        let inner = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .build()?;
        Ok(Self { inner })
    }

    /// GET a URL and deserialize the JSON response
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self.inner.get(url).send()?;
        Self::decode(resp)
    }

    /// GET a URL with query parameters and deserialize the JSON response
    ///
    /// Parameter values are URL-encoded by reqwest.
    pub fn get_json_query<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let resp = self.inner.get(url).query(params).send()?;
        Self::decode(resp)
    }

    fn decode<T: DeserializeOwned>(resp: reqwest::blocking::Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let detail = resp
                .text()
                .ok()
                .and_then(|body| extract_detail(&body))
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unexpected response")
                        .to_string()
                });
            return Err(AppError::Api {
                status: status.as_u16(),
                detail,
            });
        }
        let data = resp.json::<T>()?;
        Ok(data)
    }
}

/// Pull the human-readable `detail` field out of a JSON error body
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let detail = value.get("detail")?.as_str()?;
    if detail.trim().is_empty() {
        None
    } else {
        Some(detail.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_get_json_invalid_url() {
        let client = HttpClient::new().unwrap();
        let result: Result<serde_json::Value> = client.get_json("http://invalid.invalid.invalid");
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_detail() {
        let body = r#"{"detail": "El servicio de BVG no está disponible"}"#;
        assert_eq!(
            extract_detail(body),
            Some("El servicio de BVG no está disponible".to_string())
        );
    }

    #[test]
    fn test_extract_detail_missing_field() {
        assert_eq!(extract_detail(r#"{"error": "nope"}"#), None);
    }

    #[test]
    fn test_extract_detail_not_json() {
        assert_eq!(extract_detail("<html>502 Bad Gateway</html>"), None);
    }

    #[test]
    fn test_extract_detail_empty_string() {
        assert_eq!(extract_detail(r#"{"detail": "  "}"#), None);
    }

    #[test]
    fn test_extract_detail_non_string() {
        assert_eq!(extract_detail(r#"{"detail": 42}"#), None);
    }
}
