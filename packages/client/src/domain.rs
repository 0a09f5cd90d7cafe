//! Domain logic for client-side operations.
//!
//! Pure functions over server lines and errors, kept free of I/O so they are
//! easy to test.

use crate::error::ClientError;

/// First line the server sends after a successful login
const LOGIN_SUCCESS: &str = "login successful";
/// Line the server sends when the login handshake ran out of time
const LOGIN_TIMED_OUT: &str = "timed out";
const ERROR_PREFIX: &str = "Error: ";
const FAREWELL_PREFIX: &str = "Exit:";

/// How the server answered the username line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginReply {
    Accepted,
    Rejected(String),
    TimedOut,
}

/// Classify the first line the server writes after the username.
///
/// # Arguments
///
/// * `line` - The first line received after sending the username
///
/// # Returns
///
/// The login outcome. Anything that is neither a success nor a timeout is
/// treated as a rejection carrying the line as the reason.
pub fn classify_login_reply(line: &str) -> LoginReply {
    let line = line.trim();
    if line == LOGIN_SUCCESS {
        LoginReply::Accepted
    } else if line == LOGIN_TIMED_OUT {
        LoginReply::TimedOut
    } else {
        let reason = line.strip_prefix(ERROR_PREFIX).unwrap_or(line);
        LoginReply::Rejected(reason.to_string())
    }
}

/// Whether `line` is the server's goodbye after a logout.
pub fn is_farewell(line: &str) -> bool {
    line.starts_with(FAREWELL_PREFIX)
}

/// Check if the client should exit immediately based on the error type.
///
/// # Arguments
///
/// * `error` - The client error to check
///
/// # Returns
///
/// `true` if the error requires immediate exit (e.g., LoginRejected),
/// `false` otherwise
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(error, ClientError::LoginRejected(_))
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
///
/// # Returns
///
/// `true` if reconnection should be attempted, `false` otherwise
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    // Don't reconnect if the error requires immediate exit
    if should_exit_immediately(error) {
        return false;
    }

    // Don't reconnect if we've exhausted all attempts
    current_attempt < max_attempts
}
