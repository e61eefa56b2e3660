//! Engine error taxonomy

use thiserror::Error;

/// Errors surfaced by the request lifecycle engine.
///
/// Handler-originated failures are converted to a uniform 500 response; no
/// failure leaves a request connection without a response. Configuration
/// errors are fatal at startup.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Handler error: {0}")]
    Handler(String),

    #[error("Handler timed out after {0} seconds")]
    Timeout(u64),

    #[error("Failed to read request body: {0}")]
    Body(String),

    #[error("Unknown configuration version: {0}")]
    UnknownConfigVersion(u32),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// HTTP status a request-scoped error completes with
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Timeout(_) => 504,
            Self::UnknownFormat(_) => 400,
            Self::Handler(_) | Self::Body(_) => 500,
            Self::UnknownConfigVersion(_) | Self::InvalidConfig(_) | Self::Io(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error_maps_to_500() {
        assert_eq!(EngineError::Handler("boom".to_string()).http_status(), 500);
    }

    #[test]
    fn test_timeout_maps_to_504() {
        assert_eq!(EngineError::Timeout(30).http_status(), 504);
    }

    #[test]
    fn test_unknown_version_message() {
        let err = EngineError::UnknownConfigVersion(3);
        assert_eq!(err.to_string(), "Unknown configuration version: 3");
    }
}
