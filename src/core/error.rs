// SPDX-License-Identifier: MIT OR Apache-2.0

//! FireHose Core Error Types
//!
//! Errors raised while configuring the aggregator, talking to instances,
//! decoding frames and compiling filter patterns.

use thiserror::Error;

/// Result type for FireHose operations
pub type FireHoseResult<T> = Result<T, FireHoseError>;

/// FireHose error types
#[derive(Error, Debug)]
pub enum FireHoseError {
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        config_key: Option<String>,
    },

    /// Transport-level failure to establish or keep a streaming connection.
    #[error("Connection unavailable: {message}")]
    ConnectionUnavailable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Malformed envelope, payload or post. Only ever affects a single frame.
    #[error("Protocol error: {message}")]
    Protocol {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The user supplied pattern is not a valid matcher expression.
    #[error("Invalid filter '{pattern}': {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

// Custom error creation helpers
impl FireHoseError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            config_key: None,
        }
    }

    /// Create a configuration error with a specific key
    pub fn configuration_with_key(message: impl Into<String>, config_key: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            config_key: Some(config_key.into()),
        }
    }

    /// Create a connection unavailable error
    pub fn connection_unavailable(message: impl Into<String>) -> Self {
        Self::ConnectionUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection unavailable error with source
    pub fn connection_unavailable_with_source(
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::ConnectionUnavailable {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
            source: None,
        }
    }

    /// Create a protocol error wrapping a decode failure
    pub fn protocol_with_source(
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Protocol {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn invalid_filter(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidFilter {
            pattern: pattern.into(),
            source,
        }
    }

    /// Create a generic error from a string
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Errors that only affect one inbound frame and must never stop a connector.
    pub fn is_per_frame(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }
}

impl From<serde_json::Error> for FireHoseError {
    fn from(e: serde_json::Error) -> Self {
        Self::protocol_with_source(format!("JSON decode failed: {}", e), Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error() {
        let error = FireHoseError::configuration("test error");
        assert!(matches!(error, FireHoseError::Configuration { .. }));
        assert_eq!(error.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_configuration_error_with_key() {
        let error = FireHoseError::configuration_with_key("must not be empty", "instances");
        match error {
            FireHoseError::Configuration { config_key, .. } => {
                assert_eq!(config_key.as_deref(), Some("instances"))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_json_error_is_protocol_error() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error: FireHoseError = err.into();
        assert!(error.is_per_frame());
        assert!(error.to_string().starts_with("Protocol error: JSON decode failed"));
    }

    #[test]
    fn test_invalid_filter_error() {
        let source = regex::Regex::new("(unclosed").unwrap_err();
        let error = FireHoseError::invalid_filter("(unclosed", source);
        assert!(matches!(error, FireHoseError::InvalidFilter { .. }));
        assert!(!error.is_per_frame());
        assert!(error.to_string().contains("(unclosed"));
    }

    #[test]
    fn test_connection_error_is_not_per_frame() {
        let error = FireHoseError::connection_unavailable("refused");
        assert!(!error.is_per_frame());
    }
}
