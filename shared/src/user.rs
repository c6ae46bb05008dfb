use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trait tag marking a record as an automated agent rather than a person.
pub const BOT_TRAIT: &str = "bot";

/// Records at or below this many minutes count as tourists.
pub const TOURIST_MAX_MINUTES: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub online: bool,
    pub minutes: u64,
    pub last_seen: DateTime<Utc>,
    #[serde(default)]
    pub traits: Vec<String>,
}

impl UserRecord {
    pub fn has_trait(&self, tag: &str) -> bool {
        self.traits.iter().any(|t| t == tag)
    }

    pub fn is_bot(&self) -> bool {
        self.has_trait(BOT_TRAIT)
    }

    pub fn is_tourist(&self) -> bool {
        self.minutes <= TOURIST_MAX_MINUTES
    }
}

/// Stable sort by cumulative minutes, highest first. Ties keep feed order.
pub fn sort_by_minutes_desc(users: &mut [UserRecord]) {
    users.sort_by(|a, b| b.minutes.cmp(&a.minutes));
}
