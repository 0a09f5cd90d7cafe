//! Error types for the session boundary.

use thiserror::Error;

/// Why a session ended abnormally
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading from or writing to the transport failed
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer hung up before sending a username
    #[error("connection closed before login")]
    ClosedBeforeLogin,

    /// The Directory refused the login
    #[error("login rejected: {0}")]
    LoginRejected(String),

    /// Neither success nor failure arrived in time
    #[error("login timed out")]
    LoginTimeout,

    /// The Directory's mailbox is closed
    #[error("directory unreachable")]
    DirectoryUnreachable,
}
