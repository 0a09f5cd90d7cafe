//! Line protocol: turns one line of user text into a request.
//!
//! ```text
//! ?create general      -> Command { verb: Create, argument: "general" }
//! ?general hello all   -> Say { room: "general", text: "hello all" }
//! ```

use thiserror::Error;

use crate::domain::Verb;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Command { verb: Verb, argument: String },
    Say { room: String, text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unrecognized input: start commands with '?', type \"?help\" for usage instructions")]
    MissingPrefix,

    #[error("empty command: type \"?help\" for usage instructions")]
    EmptyCommand,

    #[error("empty message: use \"?{0}\" followed by a space and the message to send to room")]
    EmptyMessage(String),
}

/// Parse one line; blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Request>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let rest = line.strip_prefix('?').ok_or(ParseError::MissingPrefix)?;
    let (head, tail) = match rest.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim()),
        None => (rest, ""),
    };
    if head.is_empty() {
        return Err(ParseError::EmptyCommand);
    }

    if let Ok(verb) = head.parse::<Verb>() {
        return Ok(Some(Request::Command {
            verb,
            argument: tail.to_string(),
        }));
    }

    if tail.is_empty() {
        return Err(ParseError::EmptyMessage(head.to_string()));
    }
    Ok(Some(Request::Say {
        room: head.to_string(),
        text: tail.to_string(),
    }))
}
