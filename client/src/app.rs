use leptos::prelude::*;

use std::cell::RefCell;

use baltimare_shared::{
    Leaderboard, UpdateMode, UserRecord, UsersFilter, UsersSort, ViewSettings, aggregate,
};

use crate::board::{Header, UserRow};
use crate::bootstrap::read_bootstrap;
use crate::{live, poll};

/// Relative "last seen" labels only change at minute granularity.
const NOW_TICK_MS: i32 = 60_000;

struct NowIntervalBinding {
    window: web_sys::Window,
    interval_id: i32,
    _callback: wasm_bindgen::closure::Closure<dyn Fn()>,
}

thread_local! {
    static NOW_INTERVAL_BINDING: RefCell<Option<NowIntervalBinding>> = const { RefCell::new(None) };
}

fn clear_now_interval() {
    NOW_INTERVAL_BINDING.with(|slot| {
        if let Some(old) = slot.borrow_mut().take() {
            old.window.clear_interval_with_handle(old.interval_id);
        }
    });
}

#[component]
pub fn App() -> impl IntoView {
    let bootstrap = read_bootstrap();
    let region = bootstrap.region;
    let update_mode = bootstrap.update_mode;

    let users = RwSignal::new(bootstrap.users);
    let filter: RwSignal<UsersFilter> = RwSignal::new(UsersFilter::default());
    let sort: RwSignal<UsersSort> = RwSignal::new(UsersSort::default());
    let show_bots: RwSignal<bool> = RwSignal::new(false);
    let show_tourists: RwSignal<bool> = RwSignal::new(false);
    let now: RwSignal<i64> = RwSignal::new(chrono::Utc::now().timestamp());

    let settings = Memo::new(move |_| ViewSettings {
        filter: filter.get(),
        sort: sort.get(),
        show_bots: show_bots.get(),
        show_tourists: show_tourists.get(),
    });
    let board: Memo<Leaderboard> =
        Memo::new(move |_| users.with(|users| aggregate(users, &settings.get())));

    // Advance `now` so offline rows keep an accurate "ago" label between updates.
    Effect::new(move || {
        use wasm_bindgen::prelude::*;
        let Some(window) = web_sys::window() else {
            return;
        };
        clear_now_interval();

        let cb = Closure::<dyn Fn()>::new(move || {
            now.set(chrono::Utc::now().timestamp());
        });
        let Ok(interval_id) = window.set_interval_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            NOW_TICK_MS,
        ) else {
            return;
        };
        NOW_INTERVAL_BINDING.with(|slot| {
            *slot.borrow_mut() = Some(NowIntervalBinding {
                window: window.clone(),
                interval_id,
                _callback: cb,
            });
        });
        on_cleanup(clear_now_interval);
    });

    // Each update replaces the whole list.
    Effect::new(move || {
        let on_users = move |list: Vec<UserRecord>| {
            users.set(list);
            now.set(chrono::Utc::now().timestamp());
        };
        match update_mode {
            UpdateMode::Live => {
                live::connect(on_users);
                on_cleanup(live::disconnect);
            }
            UpdateMode::Poll => {
                poll::start(on_users);
                on_cleanup(poll::stop);
            }
        }
    });

    view! {
        <div style="display: flex; flex-direction: column; align-items: center; width: 100%; max-width: 1000px; margin: 0 auto; padding: 0 16px 64px 16px; box-sizing: border-box;">
            <Header
                board=board
                filter=filter
                sort=sort
                show_bots=show_bots
                show_tourists=show_tourists
                region=region
            />
            <div style="display: flex; flex-direction: column; gap: 4px; width: 100%;">
                {move || {
                    let board = board.get();
                    let max_minutes = board.stats.max_minutes;
                    board
                        .users
                        .into_iter()
                        .enumerate()
                        .map(|(i, user)| {
                            view! { <UserRow rank=i + 1 user=user max_minutes=max_minutes now=now /> }
                        })
                        .collect_view()
                }}
            </div>
            <p style="margin-top: 32px; font-weight: 700; opacity: 0.4;">
                {format!(
                    "there might be some users outside of {} that accidentally got logged",
                    region.key(),
                )}
            </p>
        </div>
    }
}
