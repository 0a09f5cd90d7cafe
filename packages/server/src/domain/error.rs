//! Error types for the chat core.

use thiserror::Error;

/// Every failure the Directory, a Room or a Session can report to a user.
///
/// Each variant renders as a one-line notice that is sent back inside an
/// `Error` envelope, so the messages carry the guidance the user needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// The client table is full
    #[error("capacity exceeded: the server cannot login more than {max} clients")]
    CapacityExceeded { max: usize },

    /// Login with an empty username
    #[error("empty name: exit and login with a non-empty username")]
    EmptyName,

    /// Username already logged in
    #[error("name in use: '{0}' is already logged in, exit and login with a new username")]
    NameInUse(String),

    /// Room creation with an empty name
    #[error("empty room name: chatroom cannot have an empty name, use a different name")]
    EmptyRoomName,

    /// Room name that the line protocol could not address
    #[error("invalid room name '{0}': use a single word that is not a command")]
    InvalidRoomName(String),

    /// Room creation with a name already in use
    #[error("chatroom already exists: use \"?join {0}\" (without the quotes) to join room")]
    RoomExists(String),

    /// Join or leave referencing an unknown room
    #[error("room does not exist: use \"?create {0}\" (without the quotes) to create room")]
    RoomNotFound(String),

    /// Second join of the same name
    #[error("already a member of '{0}': use \"?{0}\" followed by a space and the message to post")]
    AlreadyMember(String),

    /// Chat line or leave addressed to a room the session has not joined
    #[error("not a member of '{0}': use \"?join {0}\" (without the quotes) first")]
    NotMember(String),

    /// The room terminated after its capabilities were handed out
    #[error("room '{0}' no longer exists")]
    RoomGone(String),

    /// Second login on one connection
    #[error("already logged in as '{0}'")]
    AlreadyLoggedIn(String),

    /// Login handshake did not complete in time
    #[error("timed out")]
    LoginTimeout,

    /// The receiving actor's mailbox is closed
    #[error("mailbox unreachable")]
    Unreachable,
}
