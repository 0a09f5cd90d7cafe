//! Client execution logic with reconnection support.

use std::time::Duration;

use super::{
    domain::{should_attempt_reconnect, should_exit_immediately},
    error::ClientError,
    session::run_client_session,
    ui::spawn_line_reader,
};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;

/// Run the chat client with reconnection logic
///
/// Asks for the username once and reuses it on every reconnect.
///
/// # Errors
///
/// Returns the last error once the login is rejected or every reconnect
/// attempt has failed.
pub async fn run_client(addr: String) -> Result<(), ClientError> {
    println!("Welcome.");
    let mut input = spawn_line_reader();
    let Some(username) = input.recv().await else {
        return Ok(());
    };

    let mut reconnect_count = 0;
    loop {
        tracing::info!(
            "Attempting to connect to {} as '{}' (attempt {}/{})",
            addr,
            username,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        match run_client_session(&addr, &username, &mut input).await {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                return Ok(());
            }
            Err(e) if should_exit_immediately(&e) => {
                tracing::error!("Cannot log in as '{}': {}", username, e);
                return Err(e);
            }
            Err(e) => {
                tracing::warn!("Connection lost: {}", e);
                reconnect_count += 1;

                if !should_attempt_reconnect(&e, reconnect_count, MAX_RECONNECT_ATTEMPTS) {
                    tracing::error!(
                        "Failed to reconnect after {} attempts. Exiting.",
                        MAX_RECONNECT_ATTEMPTS
                    );
                    return Err(e);
                }

                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    RECONNECT_INTERVAL_SECS,
                    reconnect_count + 1,
                    MAX_RECONNECT_ATTEMPTS
                );

                tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
            }
        }
    }
}
