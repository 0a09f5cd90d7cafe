//! Error types for the chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server refused the username
    #[error("Login rejected: {0}")]
    LoginRejected(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::ConnectionError(e.to_string())
    }
}
