use serde::{Deserialize, Serialize};

use crate::user::UserRecord;

/// Name of the live event carrying a full replacement user list.
pub const USERS_EVENT: &str = "users";

/// Id of the `application/json` script element carrying the server-rendered snapshot.
pub const INITIAL_USERS_ELEMENT_ID: &str = "initial-users";

/// How the client keeps its user list fresh after the initial snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Server-sent `users` events.
    #[default]
    Live,
    /// Fetch `/api/users` once a minute.
    Poll,
}

impl UpdateMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Poll => "poll",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "live" | "sse" => Some(Self::Live),
            "poll" | "polling" => Some(Self::Poll),
            _ => None,
        }
    }
}

pub fn parse_users_payload(data: &str) -> Result<Vec<UserRecord>, serde_json::Error> {
    serde_json::from_str(data)
}
