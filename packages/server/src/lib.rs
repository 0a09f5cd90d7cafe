//! Multi-room chat relay built from actors.
//!
//! A single [`actor::Directory`] owns the client and room tables; every room
//! is an [`actor::Room`] that owns its members, history and lifetime. Actors
//! share nothing and talk only by posting [`domain::Envelope`]s to each
//! other's mailboxes through [`domain::Capability`] handles.

pub mod actor;
pub mod config;
pub mod domain;
pub mod session;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_support;
