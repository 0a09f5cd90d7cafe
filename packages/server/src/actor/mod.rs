//! The actors that own all mutable chat state.

mod directory;
mod room;

pub use directory::{ClientRecord, Directory};
pub use room::{Room, RoomRecord, RoomState};
