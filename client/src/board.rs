use chrono::{DateTime, Utc};
use leptos::prelude::*;

use baltimare_shared::format::{add_separators, bar_fraction, format_minutes, format_since};
use baltimare_shared::{Leaderboard, Region, UserRecord, UsersFilter, UsersSort, Visibility};

use crate::colors::{GREEN, LIME, rgba_css};

const SOURCE_CODE_URL: &str = "https://github.com/makidoll/baltimare-leaderboard";
const TRACKING_SINCE: &str = "august 12th 2024";

fn home_url(region: Region) -> &'static str {
    match region {
        Region::Baltimare => "https://baltimare.pages.dev",
        Region::Cloudsdale => "/",
    }
}

/// Tourists are only named in the headline count when they are shown.
fn seen_in_total_suffix(show_tourists: bool) -> &'static str {
    if show_tourists {
        "and tourists seen in total"
    } else {
        "seen in total"
    }
}

/// Highlighted figures of the header summary lines.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Summary {
    online: String,
    seen: String,
    collective: String,
}

impl Summary {
    fn of(board: &Leaderboard) -> Self {
        Self {
            online: format!("{} online", add_separators(board.stats.online_count as u64)),
            seen: format!("{} popens", add_separators(board.len() as u64)),
            collective: format_minutes(board.stats.total_minutes),
        }
    }
}

/// Radio-style picker over a fixed set of labels.
#[component]
pub fn OptionPicker(
    icon: &'static str,
    text: &'static str,
    values: Vec<&'static str>,
    value: Signal<&'static str>,
    #[prop(into)] on_pick: Callback<&'static str>,
) -> impl IntoView {
    view! {
        <div style="display: flex; flex-direction: column; align-items: flex-start; font-weight: 700; font-size: 16px; user-select: none; opacity: 0.8;">
            <div style="font-weight: 900; margin-bottom: 4px;">
                <span style="margin-right: 4px;">{icon}</span>
                {text}
            </div>
            {values
                .into_iter()
                .map(|option| {
                    let selected = move || value.get() == option;
                    view! {
                        <div
                            style="cursor: pointer;"
                            style:opacity=move || if selected() { "0.75" } else { "0.5" }
                            on:click=move |_| on_pick.run(option)
                        >
                            <span style="margin-right: 4px;">
                                {move || if selected() { "\u{25C9}" } else { "\u{25CB}" }}
                            </span>
                            {option}
                        </div>
                    }
                })
                .collect_view()}
        </div>
    }
}

/// Logo, summary lines and the four view-setting pickers.
#[component]
pub fn Header(
    board: Memo<Leaderboard>,
    filter: RwSignal<UsersFilter>,
    sort: RwSignal<UsersSort>,
    show_bots: RwSignal<bool>,
    show_tourists: RwSignal<bool>,
    region: Region,
) -> impl IntoView {
    let green = rgba_css(GREEN, 1.0);
    let green_dim = rgba_css(GREEN, 0.6);
    let lime = rgba_css(LIME, 1.0);
    let lime_dim = rgba_css(LIME, 0.6);

    let summary = Memo::new(move |_| board.with(Summary::of));
    let online_text = move || summary.with(|s| s.online.clone());
    let seen_text = move || summary.with(|s| s.seen.clone());
    let collective_text = move || summary.with(|s| s.collective.clone());

    view! {
        <a href=home_url(region)>
            <img
                src=format!("{}-opg.png", region.key())
                alt=region.title()
                style="width: 600px; max-width: 100%; margin-top: 32px;"
            />
        </a>
        <div style="display: flex; flex-direction: row; margin-top: 16px; margin-bottom: 8px; width: calc(100% - 8px); justify-content: flex-end; align-items: flex-end;">
            <div style="display: flex; flex-direction: column; align-items: flex-start;">
                <div style=format!("font-size: 16px; font-weight: 700; color: {green_dim};")>
                    "> " <span style=format!("color: {green};")>{online_text}</span> " right now"
                    <br />
                    "> " <span style=format!("color: {green};")>{seen_text}</span> " "
                    {move || seen_in_total_suffix(show_tourists.get())}
                    <br />
                    "> " <span style=format!("color: {green};")>{collective_text}</span> " collectively together"
                </div>
                <div style=format!("font-size: 16px; margin-top: 8px; font-weight: 700; color: {lime_dim};")>
                    "> total time online since " <span style=format!("color: {lime};")>{TRACKING_SINCE}</span>
                    <br />
                    "> also how long ago since last online"
                </div>
                <div style="display: flex; flex-direction: row; gap: 32px; width: 100%; align-items: flex-start; justify-content: flex-start; margin-top: 16px; margin-bottom: 12px;">
                    <OptionPicker
                        icon="\u{25BD}"
                        text="filter"
                        values=UsersFilter::ALL.map(UsersFilter::label).to_vec()
                        value=Signal::derive(move || filter.get().label())
                        on_pick=Callback::new(move |label: &'static str| {
                            if let Some(value) = UsersFilter::from_label(label) {
                                filter.set(value);
                            }
                        })
                    />
                    <OptionPicker
                        icon="\u{21C5}"
                        text="sort"
                        values=UsersSort::ALL.map(UsersSort::label).to_vec()
                        value=Signal::derive(move || sort.get().label())
                        on_pick=Callback::new(move |label: &'static str| {
                            if let Some(value) = UsersSort::from_label(label) {
                                sort.set(value);
                            }
                        })
                    />
                    <OptionPicker
                        icon="\u{2699}"
                        text="bots"
                        values=Visibility::ALL.map(Visibility::label).to_vec()
                        value=Signal::derive(move || Visibility::from(show_bots.get()).label())
                        on_pick=Callback::new(move |label: &'static str| {
                            if let Some(value) = Visibility::from_label(label) {
                                show_bots.set(value.is_shown());
                            }
                        })
                    />
                    <OptionPicker
                        icon="\u{2602}"
                        text="tourists"
                        values=Visibility::ALL.map(Visibility::label).to_vec()
                        value=Signal::derive(move || Visibility::from(show_tourists.get()).label())
                        on_pick=Callback::new(move |label: &'static str| {
                            if let Some(value) = Visibility::from_label(label) {
                                show_tourists.set(value.is_shown());
                            }
                        })
                    />
                </div>
            </div>
            <div style="flex-grow: 1;" />
            <a href=SOURCE_CODE_URL style="opacity: 0.4; margin-right: 80px; color: inherit; font-weight: 700;">
                "source"
            </a>
        </div>
    }
}

fn status_text(user: &UserRecord, now: DateTime<Utc>) -> String {
    if user.online {
        "online".to_string()
    } else {
        format_since(user.last_seen, now)
    }
}

/// One ranked row: time bar scaled to the leader, total time and last-seen status.
#[component]
pub fn UserRow(rank: usize, user: UserRecord, max_minutes: u64, now: RwSignal<i64>) -> impl IntoView {
    let width = format!("{:.2}%", bar_fraction(user.minutes, max_minutes) * 100.0);
    let bar_color = if user.online {
        rgba_css(GREEN, 0.35)
    } else {
        rgba_css((255, 255, 255), 0.08)
    };
    let status_color = if user.online {
        rgba_css(GREEN, 1.0)
    } else {
        rgba_css((255, 255, 255), 0.4)
    };
    let minutes = format_minutes(user.minutes);
    let is_bot = user.is_bot();
    let username = user.username.clone();
    let status = move || {
        let now = DateTime::from_timestamp(now.get(), 0).unwrap_or_else(Utc::now);
        status_text(&user, now)
    };

    view! {
        <div style="position: relative; display: flex; flex-direction: row; align-items: center; height: 32px; border-radius: 4px; overflow: hidden; background: rgba(255,255,255,0.03); font-weight: 700;">
            <div style=format!("position: absolute; left: 0; top: 0; bottom: 0; width: {width}; background: {bar_color};") />
            <span style="position: relative; width: 48px; text-align: right; margin-right: 12px; opacity: 0.4; font-variant-numeric: tabular-nums;">
                {rank}
            </span>
            <span style="position: relative; flex-grow: 1; overflow: hidden; text-overflow: ellipsis; white-space: nowrap;">
                {username}
                {is_bot.then(|| view! { <span style="margin-left: 6px; opacity: 0.4;">"bot"</span> })}
            </span>
            <span style="position: relative; margin-right: 16px; font-variant-numeric: tabular-nums;">{minutes}</span>
            <span style=format!("position: relative; width: 96px; margin-right: 8px; text-align: right; color: {status_color};")>
                {status}
            </span>
        </div>
    }
}
