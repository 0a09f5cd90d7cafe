//! Multi-room line-oriented chat server.
//!
//! Clients log in with a unique name, create or join rooms, and chat.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin parley-server
//! cargo run --bin parley-server -- --host 0.0.0.0 --port 3000 --max-clients 50
//! ```

use std::time::Duration;

use clap::Parser;
use parley_server::{config::ServerConfig, ui::Server};
use parley_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "parley-server")]
#[command(about = "Multi-room chat server over TCP", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "2000")]
    port: u16,

    /// Maximum number of concurrently logged-in clients
    #[arg(long, default_value_t = parley_server::config::DEFAULT_MAX_CLIENTS)]
    max_clients: usize,

    /// Number of messages each room keeps for new members
    #[arg(long, default_value_t = parley_server::config::DEFAULT_HISTORY_CAPACITY)]
    history_capacity: usize,

    /// Seconds a room lives after creation
    #[arg(long, default_value_t = parley_server::config::DEFAULT_ROOM_LIFETIME.as_secs())]
    room_lifetime_secs: u64,

    /// Milliseconds a login may take before it is abandoned
    #[arg(long, default_value_t = parley_server::config::DEFAULT_LOGIN_TIMEOUT.as_millis() as u64)]
    login_timeout_ms: u64,
}

impl Args {
    fn config(&self) -> ServerConfig {
        ServerConfig {
            max_clients: self.max_clients,
            history_capacity: self.history_capacity,
            room_lifetime: Duration::from_secs(self.room_lifetime_secs),
            login_timeout: Duration::from_millis(self.login_timeout_ms),
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();
    let config = args.config();
    tracing::debug!("Starting with {:?}", config);

    if let Err(e) = Server::new(config).run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
