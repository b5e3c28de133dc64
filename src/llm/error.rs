//! LLM backend errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors that can occur while talking to the inference runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BackendError {
    /// The runtime answered with an error
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// Request timed out after the specified duration (in seconds)
    TimeoutError { seconds: u64 },

    /// The runtime answered but the reply is unusable
    InvalidResponse {
        message: String,
        raw_response: Option<String>,
    },

    /// Invalid settings (unknown provider, bad endpoint URL)
    ConfigurationError { message: String },

    /// Network-related error
    NetworkError { message: String },

    Other { message: String },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::ApiError {
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "API error ({}): {}", code, message)
                } else {
                    write!(f, "API error: {}", message)
                }
            }
            BackendError::TimeoutError { seconds } => {
                write!(f, "Request timed out after {} seconds", seconds)
            }
            BackendError::InvalidResponse { message, .. } => {
                write!(f, "Invalid response from LLM: {}", message)
            }
            BackendError::ConfigurationError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            BackendError::NetworkError { message } => {
                write!(f, "Network error: {}", message)
            }
            BackendError::Other { message } => {
                write!(f, "Error: {}", message)
            }
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = BackendError::ApiError {
            message: "model not loaded".to_string(),
            status_code: Some(503),
        };
        assert_eq!(err.to_string(), "API error (503): model not loaded");

        let err = BackendError::TimeoutError { seconds: 120 };
        assert_eq!(err.to_string(), "Request timed out after 120 seconds");

        let err = BackendError::InvalidResponse {
            message: "empty answer".to_string(),
            raw_response: None,
        };
        assert_eq!(err.to_string(), "Invalid response from LLM: empty answer");
    }
}
