//! Renders envelopes as the lines a connected user reads.

use parley_shared::time::timestamp_to_rfc3339;

use crate::domain::{Envelope, Kind};

/// Line formatter for session output
pub struct LineFormatter;

impl LineFormatter {
    /// Format a chat line
    ///
    /// # Arguments
    ///
    /// * `room` - The room the line was posted to
    /// * `from` - The name of the sender
    /// * `text` - The message content
    /// * `sent_at` - Unix timestamp when the message was sent (milliseconds)
    pub fn format_content(room: &str, from: &str, text: &str, sent_at: i64) -> String {
        format!("[{} {}] {}: {}", room, timestamp_to_rfc3339(sent_at), from, text)
    }

    /// Format the terminal notice of an expired room
    pub fn format_expired(room: &str, expired_at: i64) -> String {
        format!("[{} {}] room has expired", room, timestamp_to_rfc3339(expired_at))
    }

    /// Format the confirmation shown once both room capabilities arrived
    pub fn format_joined(room: &str) -> String {
        format!(
            "{}: You have joined chatroom, use ?{} followed by space and the message to send to room",
            room, room
        )
    }

    pub fn format_left(room: &str) -> String {
        format!("{}: You have left chatroom", room)
    }

    pub fn format_error(message: &str) -> String {
        format!("Error: {}", message)
    }

    pub fn format_notice(subject: &str, body: &str) -> String {
        format!("{} {}", subject, body).trim().to_string()
    }

    /// Render an envelope, or `None` for kinds a user never sees directly
    /// (capability grants and commands).
    pub fn render(envelope: &Envelope) -> Option<String> {
        match envelope.kind() {
            Kind::Content => Some(Self::format_content(
                envelope.subject(),
                envelope.author().unwrap_or("?"),
                envelope.body(),
                envelope.sent_at(),
            )),
            Kind::Expired => Some(Self::format_expired(envelope.subject(), envelope.sent_at())),
            Kind::Error => Some(Self::format_error(envelope.body())),
            Kind::Notice | Kind::Exit => {
                Some(Self::format_notice(envelope.subject(), envelope.body()))
            }
            Kind::Admin(_) | Kind::Command(_) => None,
        }
    }
}
