//! Server tunables.

use std::time::Duration;

/// Maximum number of concurrently logged-in clients
pub const DEFAULT_MAX_CLIENTS: usize = 10;
/// Number of content envelopes a room keeps for replay
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;
/// A room expires this long after creation, regardless of activity
pub const DEFAULT_ROOM_LIFETIME: Duration = Duration::from_secs(7 * 24 * 60 * 60);
/// Upper bound on the login handshake
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_millis(1500);

/// Tunables shared by the Directory, every Room and every Session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub max_clients: usize,
    pub history_capacity: usize,
    pub room_lifetime: Duration,
    pub login_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_clients: DEFAULT_MAX_CLIENTS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            room_lifetime: DEFAULT_ROOM_LIFETIME,
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
        }
    }
}
