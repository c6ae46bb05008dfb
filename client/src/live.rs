use std::cell::RefCell;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{EventSource, MessageEvent};

use baltimare_shared::{USERS_EVENT, UserRecord, parse_users_payload};

const EVENTS_URL: &str = "/api/events";

struct LiveConnection {
    es: EventSource,
    users_handler: Closure<dyn Fn(MessageEvent)>,
}

impl LiveConnection {
    fn close(self) {
        self.es
            .remove_event_listener_with_callback(
                USERS_EVENT,
                self.users_handler.as_ref().unchecked_ref(),
            )
            .ok();
        self.es.close();
    }
}

thread_local! {
    static LIVE_CONNECTION: RefCell<Option<LiveConnection>> = const { RefCell::new(None) };
}

/// Close the live connection, if one is open.
pub fn disconnect() {
    LIVE_CONNECTION.with(|slot| {
        let mut slot = slot.borrow_mut();
        if let Some(connection) = slot.take() {
            connection.close();
        }
    });
}

/// Subscribe to `users` events; `on_users` receives every replacement list.
///
/// Reconnects are left to `EventSource` itself. While it is down the last
/// list simply stays on screen.
pub fn connect<F>(on_users: F)
where
    F: Fn(Vec<UserRecord>) + 'static,
{
    let es = match EventSource::new(EVENTS_URL) {
        Ok(es) => es,
        Err(e) => {
            web_sys::console::warn_2(&"failed to open live user events".into(), &e);
            return;
        }
    };

    let users_handler = Closure::<dyn Fn(MessageEvent)>::new(move |e: MessageEvent| {
        let Some(data) = e.data().as_string() else {
            return;
        };
        match parse_users_payload(&data) {
            Ok(users) => on_users(users),
            Err(err) => {
                web_sys::console::warn_1(&format!("dropping malformed users event: {err}").into());
            }
        }
    });
    es.add_event_listener_with_callback(USERS_EVENT, users_handler.as_ref().unchecked_ref())
        .ok();

    // Replace any existing connection, ensuring handlers are unregistered cleanly.
    LIVE_CONNECTION.with(|slot| {
        let mut slot = slot.borrow_mut();
        if let Some(old) = slot.take() {
            old.close();
        }
        *slot = Some(LiveConnection { es, users_handler });
    });
}
