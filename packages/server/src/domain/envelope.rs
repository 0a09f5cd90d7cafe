//! The immutable value exchanged between actors.

use std::{fmt, str::FromStr};

use super::Capability;

/// Command verbs understood by the Directory and by Room control mailboxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Login,
    Create,
    Join,
    Leave,
    List,
    Logout,
    Help,
    /// Room to Directory only: the room has expired and must be forgotten
    Destroy,
}

impl Verb {
    /// Verbs a user can type, in the order the help text lists them.
    pub const USER_VERBS: [Verb; 6] = [
        Verb::Create,
        Verb::List,
        Verb::Join,
        Verb::Leave,
        Verb::Logout,
        Verb::Help,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Login => "login",
            Verb::Create => "create",
            Verb::Join => "join",
            Verb::Leave => "leave",
            Verb::List => "list",
            Verb::Logout => "logout",
            Verb::Help => "help",
            Verb::Destroy => "destroy",
        }
    }

    /// One line of usage text for a user verb.
    pub fn usage(&self) -> &'static str {
        match self {
            Verb::Create => "?create AbC -> creates a chat room and set name to AbC",
            Verb::List => "?list -> list the existing rooms",
            Verb::Join => "?join AbC -> join chatroom AbC",
            Verb::Leave => "?leave AbC -> leave chatroom AbC",
            Verb::Logout => "?logout -> disconnect",
            Verb::Help => "?help -> usage instructions",
            Verb::Login => "the first line you send is your username",
            Verb::Destroy => "",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the verbs a user may send; `destroy` is never accepted from text.
impl FromStr for Verb {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(Verb::Login),
            "create" => Ok(Verb::Create),
            "join" => Ok(Verb::Join),
            "leave" => Ok(Verb::Leave),
            "list" => Ok(Verb::List),
            "logout" => Ok(Verb::Logout),
            "help" => Ok(Verb::Help),
            _ => Err(()),
        }
    }
}

/// A capability a room hands to a newly joined member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    /// Post content for broadcast
    Message(Capability),
    /// Post join/leave directives
    Control(Capability),
}

/// What an envelope is, and therefore how `subject` and `body` are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// `subject` is the verb, `body` its argument
    Command(Verb),
    /// A chat line: `subject` is the room, `body` the text
    Content,
    /// A capability grant: `subject` is the room
    Admin(Grant),
    /// Informational reply (login success, room list, help text)
    Notice,
    /// One-line failure notice in `body`
    Error,
    /// Terminal broadcast of a room whose lifetime elapsed: `subject` is the room
    Expired,
    /// Farewell from the Directory after logout; nothing follows it
    Exit,
}

/// Reply routing for a session's requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRef {
    pub name: String,
    /// Primary mailbox of the session
    pub reply: Capability,
    /// Error mailbox of the session
    pub errors: Capability,
}

/// Who an envelope came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// A session request that expects replies
    Session(SessionRef),
    /// Content authored by the named client; carries no capability
    Member(String),
    /// A room, identified by its control capability
    Room(Capability),
}

/// The only unit of inter-actor communication.
///
/// Envelopes are never mutated after construction: receivers read them and,
/// at most, build new ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    kind: Kind,
    subject: String,
    body: String,
    origin: Option<Origin>,
    sent_at: i64,
}

impl Envelope {
    pub fn new(
        kind: Kind,
        subject: impl Into<String>,
        body: impl Into<String>,
        origin: Option<Origin>,
        sent_at: i64,
    ) -> Self {
        Self {
            kind,
            subject: subject.into(),
            body: body.into(),
            origin,
            sent_at,
        }
    }

    /// A command from a session; replies go to `session`.
    pub fn command(verb: Verb, argument: impl Into<String>, session: SessionRef) -> Self {
        Self::new(
            Kind::Command(verb),
            verb.as_str(),
            argument,
            Some(Origin::Session(session)),
            0,
        )
    }

    /// A chat line authored by `from` for `room`.
    pub fn content(
        room: impl Into<String>,
        from: impl Into<String>,
        text: impl Into<String>,
        sent_at: i64,
    ) -> Self {
        Self::new(
            Kind::Content,
            room,
            text,
            Some(Origin::Member(from.into())),
            sent_at,
        )
    }

    pub fn grant(room: impl Into<String>, grant: Grant) -> Self {
        Self::new(Kind::Admin(grant), room, "", None, 0)
    }

    pub fn notice(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(Kind::Notice, subject, body, None, 0)
    }

    /// An `Error` envelope; `subject` names the request that failed.
    pub fn error(subject: impl Into<String>, error: impl fmt::Display) -> Self {
        Self::new(Kind::Error, subject, error.to_string(), None, 0)
    }

    pub fn expired(room: impl Into<String>, control: Capability, sent_at: i64) -> Self {
        Self::new(
            Kind::Expired,
            room,
            "room has expired",
            Some(Origin::Room(control)),
            sent_at,
        )
    }

    pub fn exit() -> Self {
        Self::new(
            Kind::Exit,
            "Exit:",
            "Session has been disconnected. Close window.",
            None,
            0,
        )
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    /// Milliseconds since the Unix epoch; zero when the envelope is not timestamped.
    pub fn sent_at(&self) -> i64 {
        self.sent_at
    }

    /// The requesting session, if this envelope expects replies.
    pub fn session(&self) -> Option<&SessionRef> {
        match &self.origin {
            Some(Origin::Session(session)) => Some(session),
            _ => None,
        }
    }

    /// Name of the client who authored this content.
    pub fn author(&self) -> Option<&str> {
        match &self.origin {
            Some(Origin::Member(name)) => Some(name),
            Some(Origin::Session(session)) => Some(&session.name),
            _ => None,
        }
    }
}
