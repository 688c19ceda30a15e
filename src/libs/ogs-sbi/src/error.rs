//! SBI Error Types

use thiserror::Error;

/// Errors raised by the SBI client and server
#[derive(Error, Debug)]
pub enum SbiError {
    /// TCP connect or HTTP handshake failed
    #[error("connection error: {0}")]
    ConnectionError(String),

    #[error("request timeout")]
    Timeout,

    #[error("invalid URI: {0}")]
    InvalidUri(String),

    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Peer answered with a non-2xx status
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    #[error("server error: {0}")]
    ServerError(String),

    #[error("client error: {0}")]
    ClientError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("hyper error: {0}")]
    HyperError(String),

    /// Peer answered 2xx but the response is unusable
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl SbiError {
    /// Create an HTTP error from status code
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::HttpError {
            status,
            message: message.into(),
        }
    }

    /// HTTP status code carried by this error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpError { status, .. } => Some(*status),
            Self::Timeout => Some(408),
            _ => None,
        }
    }
}

/// Result type for SBI operations
pub type SbiResult<T> = Result<T, SbiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_code() {
        let err = SbiError::from_status(404, "Not found");
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(SbiError::Timeout.status_code(), Some(408));
        assert_eq!(SbiError::ConnectionError("refused".into()).status_code(), None);
    }

    #[test]
    fn test_error_display() {
        let err = SbiError::from_status(503, "overloaded");
        assert_eq!(err.to_string(), "HTTP error: 503 - overloaded");
    }
}
