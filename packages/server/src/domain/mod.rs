//! Core data model: envelopes, capabilities and validated names.

mod envelope;
mod error;
mod mailbox;
mod name;

pub use envelope::{Envelope, Grant, Kind, Origin, SessionRef, Verb};
pub use error::ChatError;
pub use mailbox::{Capability, Mailbox, mailbox};
pub use name::{ClientName, RoomName};
