use std::sync::Arc;

use baltimare_shared::{UserRecord, user::sort_by_minutes_desc};
use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::{users_poll_interval, users_source_url};
use crate::state::{AppState, UsersEvent};

/// Polls the upstream presence feed and publishes every changed user list.
pub async fn run(state: AppState) {
    let Some(url) = users_source_url() else {
        warn!("user source disabled: USERS_SOURCE_URL is not set, serving an empty leaderboard");
        return;
    };

    let period = users_poll_interval();
    info!(%url, interval_secs = period.as_secs(), "user source started");
    let mut interval = tokio::time::interval(period);

    loop {
        interval.tick().await;

        match fetch_users(&state.http_client, &url).await {
            Ok(users) => {
                publish_users(&state, users).await;
            }
            Err(e) => {
                state.observability.record_upstream_error();
                warn!("Failed to fetch users: {e}");
            }
        }
    }
}

async fn fetch_users(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<UserRecord>, reqwest::Error> {
    let resp = client.get(url).send().await?.error_for_status()?;
    let users: Vec<UserRecord> = resp.json().await?;
    Ok(users)
}

/// Replace the live snapshot with `users` and broadcast it.
///
/// Returns the new sequence number, or None when the list is unchanged.
pub(crate) async fn publish_users(state: &AppState, mut users: Vec<UserRecord>) -> Option<u64> {
    sort_by_minutes_desc(&mut users);

    let json = match serde_json::to_vec(&users) {
        Ok(json) => Arc::new(Bytes::from(json)),
        Err(e) => {
            warn!(error = %e, "failed to serialize user list");
            return None;
        }
    };
    let online_count = users.iter().filter(|u| u.online).count();

    let seq = {
        let mut snapshot = state.snapshot.write().await;
        if snapshot.seq > 0 && snapshot.users_json == json {
            debug!(seq = snapshot.seq, "user list unchanged");
            return None;
        }
        snapshot.seq += 1;
        snapshot.updated_at = Utc::now().to_rfc3339();
        snapshot.user_count = users.len();
        snapshot.online_count = online_count;
        snapshot.users_json = Arc::clone(&json);
        snapshot.seq
    };

    state.observability.record_snapshot_update();
    info!(seq, users = users.len(), online = online_count, "published user list");

    // No receivers just means no browser is connected right now.
    let _ = state.event_tx.send(UsersEvent { seq, json });
    Some(seq)
}
