use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use baltimare_shared::{Region, UpdateMode};
use bytes::Bytes;
use chrono::Utc;
use tokio::sync::{RwLock, broadcast};
use tracing::warn;

use crate::config::{sse_broadcast_buffer, upstream_connect_timeout, upstream_http_timeout};

/// Pre-serialized `users` event, shared by every connected client via Arc.
#[derive(Debug, Clone)]
pub struct UsersEvent {
    pub seq: u64,
    pub json: Arc<Bytes>,
}

#[derive(Debug, Clone)]
pub struct UsersSnapshot {
    pub seq: u64,
    pub updated_at: String,
    pub user_count: usize,
    pub online_count: usize,
    pub users_json: Arc<Bytes>,
}

impl Default for UsersSnapshot {
    fn default() -> Self {
        Self {
            seq: 0,
            updated_at: Utc::now().to_rfc3339(),
            user_count: 0,
            online_count: 0,
            users_json: Arc::new(Bytes::from_static(b"[]")),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub snapshot: Arc<RwLock<UsersSnapshot>>,
    pub event_tx: broadcast::Sender<UsersEvent>,
    pub http_client: reqwest::Client,
    pub region: Region,
    pub update_mode: UpdateMode,
    /// Client `index.html` from the dist dir. None falls back to a bare shell.
    pub index_template: Option<Arc<String>>,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    users_requests_total: AtomicU64,
    index_renders_total: AtomicU64,
    sse_connections_total: AtomicU64,
    sse_lagged_total: AtomicU64,
    snapshot_updates_total: AtomicU64,
    upstream_errors_total: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub struct ObservabilitySnapshot {
    pub users_requests_total: u64,
    pub index_renders_total: u64,
    pub sse_connections_total: u64,
    pub sse_lagged_total: u64,
    pub snapshot_updates_total: u64,
    pub upstream_errors_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            users_requests_total: self.users_requests_total.load(Ordering::Relaxed),
            index_renders_total: self.index_renders_total.load(Ordering::Relaxed),
            sse_connections_total: self.sse_connections_total.load(Ordering::Relaxed),
            sse_lagged_total: self.sse_lagged_total.load(Ordering::Relaxed),
            snapshot_updates_total: self.snapshot_updates_total.load(Ordering::Relaxed),
            upstream_errors_total: self.upstream_errors_total.load(Ordering::Relaxed),
        }
    }

    pub fn record_users_request(&self) {
        self.users_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_index_render(&self) {
        self.index_renders_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sse_connection(&self) {
        self.sse_connections_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sse_lagged(&self) {
        self.sse_lagged_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshot_update(&self) {
        self.snapshot_updates_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_error(&self) {
        self.upstream_errors_total.fetch_add(1, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new(region: Region, update_mode: UpdateMode, index_template: Option<String>) -> Self {
        let (event_tx, _) = broadcast::channel(sse_broadcast_buffer());
        let request_timeout = upstream_http_timeout();
        let connect_timeout = upstream_connect_timeout();
        let http_client = reqwest::Client::builder()
            .user_agent("baltimare-leaderboard/0.1")
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .or_else(|e| {
                warn!(
                    error = %e,
                    "failed to build configured HTTP client, retrying without custom user-agent"
                );
                reqwest::Client::builder()
                    .timeout(request_timeout)
                    .connect_timeout(connect_timeout)
                    .build()
            })
            .unwrap_or_else(|e| {
                panic!("failed to build timeout-configured HTTP client: {e}");
            });
        Self {
            snapshot: Arc::new(RwLock::new(UsersSnapshot::default())),
            event_tx,
            http_client,
            region,
            update_mode,
            index_template: index_template.map(Arc::new),
            observability: Arc::new(ObservabilityCounters::default()),
        }
    }
}

#[cfg(test)]
impl AppState {
    pub(crate) fn for_tests() -> Self {
        Self::new(Region::Baltimare, UpdateMode::Live, None)
    }
}
