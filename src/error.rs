//! Error types for payload construction, tracker transport and configuration.

use thiserror::Error;

/// The issue payload could not be given every field the tracker requires.
///
/// This is a configuration or programming defect and is never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("issue payload is missing required fields: {}", missing.join(", "))]
pub struct SchemaViolation {
    pub missing: Vec<&'static str>,
}

/// A request to the tracker did not produce a usable response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failure, timeout or any other error raised by the HTTP client.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The tracker answered with a failure status and a body that is not JSON.
    #[error("tracker returned HTTP {status} with an unreadable body: {body}")]
    UnreadableBody { status: u16, body: String },

    /// A resolved attachment could not be read from local storage.
    #[error("failed to read attachment '{file_name}': {source}")]
    FileRead {
        file_name: String,
        #[source]
        source: std::io::Error,
    },
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request { source, .. } if source.is_timeout())
    }
}

/// Invalid tracker configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid endpoint url '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("endpoint url '{0}' must use http or https")]
    UnsupportedScheme(String),

    #[error("credentials must be given as 'username:password'")]
    InvalidCredentialPair,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
