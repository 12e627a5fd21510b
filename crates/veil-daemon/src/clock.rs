//! Wall-clock access.
//!
//! Library crates take `now` as an argument; the daemon is the only place
//! that reads the system clock.

use veil_types::Timestamp;

/// Current unix time in seconds.
pub fn now() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
