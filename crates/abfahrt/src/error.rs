//! Error types for the abfahrt client
//!
//! Centralized error handling using thiserror. Network failures are mapped
//! to short human-readable messages suitable for the status line.

use thiserror::Error;

/// Main error type for the abfahrt client
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{}", friendly_network_error(.0))]
    Network(#[from] reqwest::Error),

    /// Non-2xx backend response, with the `detail` message from the JSON
    /// error body when one was present
    #[error("Backend error ({status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid query: {0}")]
    Query(String),
}

/// Result type alias for the abfahrt client
pub type Result<T> = std::result::Result<T, AppError>;

fn friendly_network_error(e: &reqwest::Error) -> String {
    if e.is_builder() {
        if let Some(url) = e.url() {
            return format!("Invalid URL: {url}");
        }
        return "Invalid URL".to_string();
    }
    if e.is_connect() {
        if let Some(url) = e.url() {
            return format!("Could not connect to {}", url.host_str().unwrap_or("server"));
        }
        return "Could not connect to server".to_string();
    }
    if e.is_timeout() {
        return "Connection timed out".to_string();
    }
    if e.is_decode() {
        return "Invalid response from server".to_string();
    }
    format!("Network error: {e}")
}
