//! Interactive terminal client for the Parley chat server.

mod domain;
pub mod error;
mod runner;
mod session;
mod ui;

pub use runner::run_client;
