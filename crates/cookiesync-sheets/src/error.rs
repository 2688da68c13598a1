use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by the Google Sheets client.
#[derive(Debug, Error)]
pub enum SheetsError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("Sheets API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The token endpoint refused the service-account assertion.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The service-account key file could not be read.
    #[error("failed to read service account key {path}: {source}")]
    KeyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The key file is not a usable service-account key.
    #[error("invalid service account key: {0}")]
    InvalidKey(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),
}

impl SheetsError {
    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            SheetsError::Api { status, .. } => Some(*status),
            SheetsError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
