//! Session boundary: serves one client connection on top of the core actors.

mod connection;
mod error;
mod formatter;
mod protocol;

pub use connection::{RoomCaps, serve_connection};
pub use error::SessionError;
pub use formatter::LineFormatter;
pub use protocol::{ParseError, Request, parse_line};
