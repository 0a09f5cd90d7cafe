//! Line-oriented chat client with reconnection support.
//!
//! Connects to a Parley chat server, logs in with a username typed at the
//! prompt, then relays typed lines to the server and prints whatever it sends.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second interval).
//! A rejected login is not retried.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin parley-client
//! cargo run --bin parley-client -- --addr 127.0.0.1:3000
//! ```

use clap::Parser;

use parley_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "parley-client")]
#[command(about = "Line-oriented chat client for the Parley server", long_about = None)]
struct Args {
    /// Chat server address
    #[arg(short = 'a', long, default_value = "127.0.0.1:2000")]
    addr: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    let args = Args::parse();

    // Run the client
    if let Err(e) = parley_client::run_client(args.addr).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
