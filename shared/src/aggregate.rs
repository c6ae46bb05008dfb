use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::settings::{UsersSort, ViewSettings};
use crate::timsort;
use crate::user::UserRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardStats {
    pub max_minutes: u64,
    pub total_minutes: u64,
    pub online_count: usize,
}

impl LeaderboardStats {
    pub fn from_users(users: &[UserRecord]) -> Self {
        users.iter().fold(Self::default(), |mut stats, user| {
            stats.max_minutes = stats.max_minutes.max(user.minutes);
            stats.total_minutes = stats.total_minutes.saturating_add(user.minutes);
            if user.online {
                stats.online_count += 1;
            }
            stats
        })
    }
}

/// Filtered, ordered display list plus the summary derived from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaderboard {
    pub users: Vec<UserRecord>,
    pub stats: LeaderboardStats,
}

impl Leaderboard {
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Build the display list for `settings` from a feed snapshot.
///
/// The feed is expected to arrive sorted by minutes, highest first; that order
/// is passed through untouched unless the recency sort is selected.
pub fn aggregate(records: &[UserRecord], settings: &ViewSettings) -> Leaderboard {
    let mut shown: Vec<&UserRecord> = records
        .iter()
        .filter(|u| settings.show_bots || !u.is_bot())
        .filter(|u| settings.show_tourists || !u.is_tourist())
        .filter(|u| settings.filter.keeps(u.online))
        .collect();

    if settings.sort == UsersSort::SinceOnline {
        timsort::sort_by(&mut shown, |a, b| recency_cmp(a, b));
    }

    let users: Vec<UserRecord> = shown.into_iter().cloned().collect();
    let stats = LeaderboardStats::from_users(&users);
    Leaderboard { users, stats }
}

/// Recency comparator: two online users are equal, anything else orders by
/// `last_seen`, most recent first.
///
/// Not a total order when online users carry differing `last_seen` values, so
/// the resulting order depends on the sort algorithm. [`aggregate`] sorts with
/// [`timsort::sort_by`], which reproduces the order a browser gives.
pub fn recency_cmp(a: &UserRecord, b: &UserRecord) -> Ordering {
    if a.online && b.online {
        Ordering::Equal
    } else {
        b.last_seen.cmp(&a.last_seen)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::settings::UsersFilter;
    use crate::user::BOT_TRAIT;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_723_420_800 + secs, 0).expect("valid timestamp")
    }

    fn user(id: &str, minutes: u64, online: bool, last_seen: i64) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            username: id.to_string(),
            online,
            minutes,
            last_seen: at(last_seen),
            traits: Vec::new(),
        }
    }

    fn bot(id: &str, minutes: u64, online: bool) -> UserRecord {
        UserRecord {
            traits: vec![BOT_TRAIT.to_string()],
            ..user(id, minutes, online, 0)
        }
    }

    fn ids(board: &Leaderboard) -> Vec<&str> {
        board.users.iter().map(|u| u.id.as_str()).collect()
    }

    fn show_everything() -> ViewSettings {
        ViewSettings {
            show_bots: true,
            show_tourists: true,
            ..ViewSettings::default()
        }
    }

    #[test]
    fn online_filter_with_tourists_hidden() {
        let records = vec![
            user("a", 120, true, 0),
            user("b", 30, false, 0),
            user("c", 500, true, 0),
        ];
        let settings = ViewSettings {
            filter: UsersFilter::Online,
            ..ViewSettings::default()
        };

        let board = aggregate(&records, &settings);

        assert_eq!(ids(&board), vec!["a", "c"]);
        assert_eq!(board.stats.online_count, 2);
        assert_eq!(board.stats.total_minutes, 620);
        assert_eq!(board.stats.max_minutes, 500);
    }

    #[test]
    fn empty_input_yields_zero_stats_for_every_setting() {
        for filter in UsersFilter::ALL {
            for sort in UsersSort::ALL {
                for (show_bots, show_tourists) in
                    [(false, false), (false, true), (true, false), (true, true)]
                {
                    let settings = ViewSettings {
                        filter,
                        sort,
                        show_bots,
                        show_tourists,
                    };
                    let board = aggregate(&[], &settings);
                    assert!(board.is_empty());
                    assert_eq!(board.stats, LeaderboardStats::default());
                }
            }
        }
    }

    #[test]
    fn bots_hidden_by_default_and_restored_when_shown() {
        let records = vec![user("a", 400, true, 0), bot("robo", 9_000, true)];

        let hidden = aggregate(&records, &ViewSettings::default());
        assert_eq!(ids(&hidden), vec!["a"]);

        let shown = aggregate(
            &records,
            &ViewSettings {
                show_bots: true,
                ..ViewSettings::default()
            },
        );
        assert_eq!(ids(&shown), vec!["a", "robo"]);
        assert_eq!(shown.stats.max_minutes, 9_000);
    }

    #[test]
    fn hiding_tourists_removes_exactly_sixty_minutes_and_below() {
        let records = vec![
            user("regular", 61, false, 0),
            user("edge", 60, false, 0),
            user("new", 0, true, 0),
            user("veteran", 6_000, true, 0),
        ];

        let hidden = aggregate(&records, &ViewSettings::default());
        assert_eq!(ids(&hidden), vec!["regular", "veteran"]);

        let shown = aggregate(
            &records,
            &ViewSettings {
                show_tourists: true,
                ..ViewSettings::default()
            },
        );
        assert_eq!(ids(&shown), vec!["regular", "edge", "new", "veteran"]);
    }

    #[test]
    fn offline_filter_keeps_only_offline_users() {
        let records = vec![
            user("a", 300, true, 0),
            user("b", 200, false, 0),
            user("c", 100, false, 0),
        ];
        let board = aggregate(
            &records,
            &ViewSettings {
                filter: UsersFilter::Offline,
                ..ViewSettings::default()
            },
        );
        assert_eq!(ids(&board), vec!["b", "c"]);
        assert_eq!(board.stats.online_count, 0);
        assert_eq!(board.stats.total_minutes, 300);
        assert_eq!(board.stats.max_minutes, 200);
    }

    #[test]
    fn total_time_sort_passes_feed_order_through() {
        // Deliberately not minutes-descending: the aggregator must not re-sort.
        let records = vec![
            user("a", 100, false, 5),
            user("b", 900, true, 1),
            user("c", 300, false, 9),
        ];
        let board = aggregate(&records, &show_everything());
        assert_eq!(ids(&board), vec!["a", "b", "c"]);
    }

    #[test]
    fn aggregation_is_idempotent_and_leaves_input_untouched() {
        let records = vec![
            user("a", 100, false, 5),
            user("b", 900, true, 1),
            bot("robo", 50, true),
            user("c", 300, false, 9),
        ];
        let before = records.clone();
        let settings = ViewSettings {
            sort: UsersSort::SinceOnline,
            ..show_everything()
        };

        let first = aggregate(&records, &settings);
        let second = aggregate(&records, &settings);

        assert_eq!(first, second);
        assert_eq!(records, before);
    }

    #[test]
    fn stats_match_display_list() {
        let records = vec![
            user("a", 100, true, 0),
            user("b", 75, false, 0),
            bot("robo", 5_000, true),
            user("c", 61, true, 0),
            user("d", 10, true, 0),
        ];
        let board = aggregate(&records, &ViewSettings::default());
        let expected_total: u64 = board.users.iter().map(|u| u.minutes).sum();
        let expected_online = board.users.iter().filter(|u| u.online).count();
        let expected_max = board.users.iter().map(|u| u.minutes).max().unwrap_or(0);

        assert_eq!(board.stats.total_minutes, expected_total);
        assert_eq!(board.stats.online_count, expected_online);
        assert_eq!(board.stats.max_minutes, expected_max);
        assert!(board.stats.online_count <= board.len());
    }

    #[test]
    fn recency_cmp_treats_online_pairs_as_equal() {
        let a = user("a", 100, true, 10);
        let b = user("b", 100, true, 99);
        assert_eq!(recency_cmp(&a, &b), Ordering::Equal);
        assert_eq!(recency_cmp(&b, &a), Ordering::Equal);
    }

    #[test]
    fn recency_sort_orders_offline_users_by_last_seen() {
        let records = vec![
            user("old", 500, false, 10),
            user("newest", 400, false, 300),
            user("middle", 300, false, 200),
        ];
        let board = aggregate(
            &records,
            &ViewSettings {
                sort: UsersSort::SinceOnline,
                ..show_everything()
            },
        );
        assert_eq!(ids(&board), vec!["newest", "middle", "old"]);
    }

    #[test]
    fn recency_sort_never_reorders_online_users() {
        let records = vec![
            user("first", 500, true, 1),
            user("second", 400, true, 300),
            user("third", 300, true, 50),
        ];
        let board = aggregate(
            &records,
            &ViewSettings {
                sort: UsersSort::SinceOnline,
                ..show_everything()
            },
        );
        assert_eq!(ids(&board), vec!["first", "second", "third"]);
    }

    #[test]
    fn recency_sort_keeps_online_pairs_in_feed_order() {
        // Online users whose last_seen is older than an offline user's stay
        // behind their online neighbour, since the pair compares equal.
        let records = vec![
            user("online-old", 500, true, 5),
            user("online-new", 400, true, 10),
            user("offline-mid", 300, false, 7),
        ];
        let board = aggregate(
            &records,
            &ViewSettings {
                sort: UsersSort::SinceOnline,
                ..show_everything()
            },
        );
        assert_eq!(ids(&board), vec!["online-old", "online-new", "offline-mid"]);

        let records = vec![
            user("online-new", 500, true, 10),
            user("offline-mid", 400, false, 7),
            user("online-old", 300, true, 5),
        ];
        let board = aggregate(
            &records,
            &ViewSettings {
                sort: UsersSort::SinceOnline,
                ..show_everything()
            },
        );
        assert_eq!(ids(&board), vec!["online-new", "offline-mid", "online-old"]);
    }

    fn since_online() -> ViewSettings {
        ViewSettings {
            sort: UsersSort::SinceOnline,
            ..show_everything()
        }
    }

    #[test]
    fn recency_sort_reverses_a_descending_run() {
        // Each neighbour compares strictly less than the one before it, so
        // the whole input is one descending run and is reversed.
        let records = vec![
            user("a", 500, true, 0),
            user("b", 400, false, 1),
            user("c", 300, true, 2),
        ];
        let board = aggregate(&records, &since_online());
        assert_eq!(ids(&board), vec!["c", "b", "a"]);
    }

    #[test]
    fn recency_sort_binary_insertion_order_for_mostly_online_input() {
        let records = vec![
            user("a", 600, false, 10),
            user("b", 500, true, 50),
            user("c", 400, true, 40),
            user("d", 300, true, 10),
            user("e", 200, true, 60),
            user("f", 100, true, 0),
        ];
        let board = aggregate(&records, &since_online());
        assert_eq!(ids(&board), vec!["b", "c", "e", "a", "d", "f"]);
    }

    #[test]
    fn recency_sort_pins_order_across_run_merges() {
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let records: Vec<UserRecord> = (0..100)
            .map(|i| {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                let r = state >> 33;
                user(&i.to_string(), 100, r % 5 < 2, ((r >> 3) % 40) as i64)
            })
            .collect();

        let board = aggregate(&records, &since_online());
        let order: Vec<usize> = board
            .users
            .iter()
            .map(|u| u.id.parse().expect("numeric id"))
            .collect();
        assert_eq!(
            order,
            vec![
                27, 97, 29, 19, 17, 43, 7, 8, 9, 18, 40, 26, 38, 49, 36, 25, 0, 1, 3, 42, 34, 4,
                6, 44, 22, 46, 10, 30, 11, 14, 41, 15, 35, 21, 32, 16, 23, 39, 48, 24, 5, 12, 13,
                20, 75, 76, 91, 50, 51, 54, 55, 99, 66, 57, 58, 67, 59, 63, 68, 69, 73, 90, 94,
                96, 84, 64, 70, 74, 79, 81, 95, 85, 98, 88, 60, 71, 80, 82, 89, 93, 61, 87, 65,
                86, 53, 33, 56, 62, 77, 2, 78, 28, 31, 37, 45, 83, 92, 47, 52, 72,
            ]
        );
    }

    #[test]
    fn recency_sort_handles_large_reversed_feed() {
        let records: Vec<UserRecord> = (0..20_000)
            .map(|i| user(&i.to_string(), 100, false, i))
            .collect();

        let board = aggregate(&records, &since_online());

        assert_eq!(board.len(), 20_000);
        assert!(
            board
                .users
                .windows(2)
                .all(|pair| pair[0].last_seen >= pair[1].last_seen)
        );
        assert_eq!(board.users[0].id, "19999");
    }

    #[test]
    fn recency_sort_moves_recent_offline_ahead_of_stale_ones() {
        let records = vec![
            user("stale", 900, false, 1),
            user("online", 800, true, 1_000),
            user("recent", 700, false, 500),
        ];
        let board = aggregate(
            &records,
            &ViewSettings {
                sort: UsersSort::SinceOnline,
                ..show_everything()
            },
        );
        assert_eq!(ids(&board), vec!["online", "recent", "stale"]);
    }

    #[test]
    fn duplicate_ids_are_kept() {
        let records = vec![user("dup", 100, true, 0), user("dup", 90, false, 0)];
        let board = aggregate(&records, &ViewSettings::default());
        assert_eq!(board.len(), 2);
        assert_eq!(board.stats.total_minutes, 190);
    }
}
