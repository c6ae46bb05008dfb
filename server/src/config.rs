use std::path::PathBuf;
use std::time::Duration;

use baltimare_shared::{Region, UpdateMode};

pub const SERVER_PORT: u16 = 3000;
pub const SSE_KEEPALIVE_SECS: u64 = 15;
pub const DEFAULT_BROADCAST_BUFFER: usize = 16;
pub const DEFAULT_USERS_POLL_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_CLIENT_DIST_DIR: &str = "client/dist";

/// Upstream feed of user records. Without it the server serves an empty board.
pub fn users_source_url() -> Option<String> {
    std::env::var("USERS_SOURCE_URL")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn users_poll_interval() -> Duration {
    std::env::var("USERS_POLL_INTERVAL_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_USERS_POLL_INTERVAL_SECS))
}

pub fn sse_broadcast_buffer() -> usize {
    std::env::var("SSE_BROADCAST_BUFFER")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_BROADCAST_BUFFER)
}

pub fn upstream_http_timeout() -> Duration {
    std::env::var("UPSTREAM_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS))
}

pub fn upstream_connect_timeout() -> Duration {
    std::env::var("UPSTREAM_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS))
}

pub fn update_mode() -> UpdateMode {
    std::env::var("UPDATE_MODE")
        .ok()
        .and_then(|value| UpdateMode::parse(&value))
        .unwrap_or_default()
}

pub fn region() -> Region {
    std::env::var("LEADERBOARD_REGION")
        .ok()
        .and_then(|value| Region::parse(&value))
        .unwrap_or_default()
}

pub fn client_dist_dir() -> PathBuf {
    std::env::var("CLIENT_DIST_DIR")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CLIENT_DIST_DIR))
}
