//! Error types for the sidebar module.

use thiserror::Error;

/// Errors that can occur while talking to the thread store or managing the sidebar.
#[derive(Debug, Error)]
pub enum SidebarError {
    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// HTTP client configuration error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// The thread store answered with a non-success status.
    #[error("{endpoint} returned status {status}")]
    Status {
        /// Endpoint that was called (method and path).
        endpoint: String,
        /// HTTP status code received.
        status: u16,
    },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Response body could not be decoded.
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The requested thread does not exist in the store.
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SidebarError {
    /// Short message suitable for display in the sidebar.
    #[must_use]
    pub fn user_message(&self, action: &str) -> String {
        match self {
            Self::HttpRequest(e) if e.is_timeout() => {
                format!("Could not {action}: the server took too long to respond.")
            }
            Self::HttpRequest(_) | Self::HttpClient(_) => {
                format!("Could not {action}: the server is unreachable.")
            }
            Self::Status { status, .. } => {
                format!("Could not {action}: the server answered with status {status}.")
            }
            Self::ThreadNotFound(_) => format!("Could not {action}: the thread no longer exists."),
            Self::InvalidUrl(_) | Self::JsonParse(_) | Self::Config(_) => {
                format!("Could not {action}: {self}")
            }
        }
    }
}

/// Result type for sidebar operations.
pub type SidebarResult<T> = Result<T, SidebarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message() {
        let err = SidebarError::Status {
            endpoint: "GET /api/thread".to_string(),
            status: 503,
        };
        assert_eq!(err.to_string(), "GET /api/thread returned status 503");
        assert_eq!(
            err.user_message("load threads"),
            "Could not load threads: the server answered with status 503."
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = SidebarError::ThreadNotFound("t9".to_string());
        assert!(err.user_message("open thread").contains("no longer exists"));
    }
}
