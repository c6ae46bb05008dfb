use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::Sse;
use axum::response::sse::{Event, KeepAlive};
use baltimare_shared::USERS_EVENT;
use bytes::Bytes;
use futures::stream::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use crate::config::SSE_KEEPALIVE_SECS;
use crate::state::AppState;

/// Live channel: the current list first, then every replacement list as it is published.
pub async fn user_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    state.observability.record_sse_connection();

    let stream = async_stream::stream! {
        // Subscribe before reading the snapshot so nothing published in between is lost.
        let rx = state.event_tx.subscribe();
        let mut stream = BroadcastStream::new(rx);

        let (mut last_sent, data) = {
            let snapshot = state.snapshot.read().await;
            (snapshot.seq, snapshot.users_json.clone())
        };
        match users_event(last_sent, data.as_ref()) {
            Some(event) => yield Ok(event),
            None => warn!("snapshot payload is not valid utf-8; skipping initial SSE event"),
        }

        while let Some(result) = stream.next().await {
            match result {
                Ok(event) => {
                    if event.seq <= last_sent {
                        continue;
                    }
                    let Some(sse_event) = users_event(event.seq, event.json.as_ref()) else {
                        warn!(seq = event.seq, "event payload is not valid utf-8; dropping SSE event");
                        continue;
                    };
                    last_sent = event.seq;
                    yield Ok(sse_event);
                }
                Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(skipped)) => {
                    state.observability.record_sse_lagged();
                    debug!(
                        skipped_events = skipped,
                        "SSE client lagged behind broadcast buffer; replaying latest list"
                    );
                    // Every event is a full list, so the latest snapshot supersedes whatever was skipped.
                    let (seq, data) = {
                        let snapshot = state.snapshot.read().await;
                        (snapshot.seq, snapshot.users_json.clone())
                    };
                    if seq <= last_sent {
                        continue;
                    }
                    let Some(sse_event) = users_event(seq, data.as_ref()) else {
                        warn!("snapshot payload is not valid utf-8; skipping SSE snapshot replay");
                        continue;
                    };
                    last_sent = seq;
                    yield Ok(sse_event);
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(SSE_KEEPALIVE_SECS))
            .text("keep-alive"),
    )
}

fn users_event(seq: u64, bytes: &Bytes) -> Option<Event> {
    let payload = std::str::from_utf8(bytes.as_ref()).ok()?;
    Some(
        Event::default()
            .id(seq.to_string())
            .event(USERS_EVENT)
            .data(payload),
    )
}
