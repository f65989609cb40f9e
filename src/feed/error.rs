//! Live feed error types

use thiserror::Error;

/// Errors that can occur in the live metrics feed
#[derive(Error, Debug)]
pub enum FeedError {
    /// Endpoint is not a ws:// or wss:// address
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),

    /// `activate` called on a feed that is already running
    #[error("Feed is already active")]
    AlreadyActive,

    /// `activate` called after the feed was deactivated
    #[error("Feed has been closed")]
    Closed,

    /// Connection could not be established
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Connection broke while reading or writing frames
    #[error("Transport error: {0}")]
    Transport(String),

    /// Payload is not an engagement snapshot
    #[error("Malformed payload: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Malformed(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for FeedError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        FeedError::Transport(err.to_string())
    }
}

/// Result type alias for feed operations
pub type FeedResult<T> = Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FeedError::InvalidUrl("http://localhost".to_string());
        assert_eq!(err.to_string(), "Invalid feed URL: http://localhost");

        let err = FeedError::AlreadyActive;
        assert_eq!(err.to_string(), "Feed is already active");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let feed_err: FeedError = json_err.into();
        assert!(matches!(feed_err, FeedError::Malformed(_)));
    }
}
