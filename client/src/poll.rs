use std::cell::Cell;

use gloo_timers::future::TimeoutFuture;
use wasm_bindgen_futures::spawn_local;

use baltimare_shared::UserRecord;

const USERS_URL: &str = "/api/users";
const MINUTE_MS: u64 = 60_000;
/// Polls land this far into each minute, after the collector's own tick.
const POLL_OFFSET_MS: u64 = 15_000;

thread_local! {
    static POLL_GENERATION: Cell<u64> = const { Cell::new(0) };
}

/// Milliseconds until the next poll slot (15 s past a minute). Never zero.
pub fn next_poll_delay_ms(now_ms: f64) -> u32 {
    let into_minute = (now_ms.max(0.0) as u64) % MINUTE_MS;
    let delay = (POLL_OFFSET_MS + MINUTE_MS - into_minute) % MINUTE_MS;
    if delay == 0 { MINUTE_MS as u32 } else { delay as u32 }
}

/// Stop the polling loop started by [`start`].
pub fn stop() {
    POLL_GENERATION.with(|generation| generation.set(generation.get().wrapping_add(1)));
}

/// Fetch `/api/users` on a fixed once-a-minute schedule until [`stop`] is called.
pub fn start<F>(on_users: F)
where
    F: Fn(Vec<UserRecord>) + 'static,
{
    stop();
    let generation = POLL_GENERATION.with(Cell::get);
    let is_current = move || POLL_GENERATION.with(Cell::get) == generation;

    spawn_local(async move {
        loop {
            TimeoutFuture::new(next_poll_delay_ms(js_sys::Date::now())).await;
            if !is_current() {
                return;
            }
            match fetch_users().await {
                Ok(users) => {
                    // A teardown can land while the request is in flight.
                    if !is_current() {
                        return;
                    }
                    on_users(users);
                }
                Err(e) => {
                    web_sys::console::debug_1(&format!("user poll failed: {e}").into());
                }
            }
        }
    });
}

async fn fetch_users() -> Result<Vec<UserRecord>, String> {
    let resp = gloo_net::http::Request::get(USERS_URL)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.json::<Vec<UserRecord>>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}
