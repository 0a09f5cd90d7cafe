//! Utilities shared by the Parley server and client.

pub mod logger;
pub mod time;
