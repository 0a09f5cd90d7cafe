//! Validated names used as table keys.

use std::fmt;

use super::{ChatError, Verb};

/// Unique key of a logged-in client
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientName(String);

impl ClientName {
    /// Create a client name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::EmptyName` if nothing is left after trimming.
    pub fn new(name: impl Into<String>) -> Result<Self, ChatError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ChatError::EmptyName);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique key of a room
///
/// Room names are addressed as `?<room> <text>` on the wire, so they must be a
/// single word and must not shadow a command verb.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomName(String);

impl RoomName {
    /// Create a room name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// * `ChatError::EmptyRoomName` - nothing is left after trimming
    /// * `ChatError::InvalidRoomName` - the name contains whitespace or is a command verb
    pub fn new(name: impl Into<String>) -> Result<Self, ChatError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ChatError::EmptyRoomName);
        }
        if trimmed.contains(char::is_whitespace) || trimmed.parse::<Verb>().is_ok() {
            return Err(ChatError::InvalidRoomName(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
