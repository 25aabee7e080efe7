//! Ollama error classification
//!
//! Every transport or protocol failure is mapped into one of these variants so
//! callers can choose a message or a recovery strategy per kind.

use thiserror::Error;

/// Failures talking to an Ollama server
#[derive(Error, Debug)]
pub enum OllamaError {
    #[error("Could not connect to Ollama: {0}")]
    Connection(String),

    #[error("Timed out waiting for Ollama: {0}")]
    Timeout(String),

    #[error("Ollama returned HTTP status {0}")]
    Status(u16),

    #[error("Ollama response is missing the '{0}' field")]
    MissingField(&'static str),

    #[error("Invalid response from Ollama: {0}")]
    InvalidResponse(String),

    #[error("Model '{model}' is not available. Available models: {available:?}")]
    ModelNotFound {
        model: String,
        available: Vec<String>,
    },

    #[error("Request to Ollama failed: {0}")]
    Request(String),

    #[error("Invalid Ollama URL: {0}")]
    Url(String),
}

impl OllamaError {
    /// Whether a retry has a chance of succeeding. Timeouts are not retried.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Status(status) => *status >= 500,
            _ => false,
        }
    }
}

impl From<ureq::Error> for OllamaError {
    #[inline]
    fn from(error: ureq::Error) -> Self {
        match error {
            ureq::Error::StatusCode(status) => Self::Status(status),
            ureq::Error::Timeout(_) => Self::Timeout(error.to_string()),
            ureq::Error::Io(ref io) if io.kind() == std::io::ErrorKind::TimedOut => {
                Self::Timeout(error.to_string())
            }
            ureq::Error::ConnectionFailed | ureq::Error::HostNotFound | ureq::Error::Io(_) => {
                Self::Connection(error.to_string())
            }
            other => Self::Request(other.to_string()),
        }
    }
}
