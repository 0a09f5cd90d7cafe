//! Network entry point of the chat server.

mod server;
mod signal;

pub use server::Server;
pub use signal::shutdown_signal;
