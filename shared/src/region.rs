use serde::{Deserialize, Serialize};

/// Which community the leaderboard is deployed for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    #[default]
    Baltimare,
    Cloudsdale,
}

impl Region {
    pub fn key(self) -> &'static str {
        match self {
            Self::Baltimare => "baltimare",
            Self::Cloudsdale => "cloudsdale",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Baltimare => "Baltimare Leaderboard",
            Self::Cloudsdale => "Cloudsdale Leaderboard",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "baltimare" => Some(Self::Baltimare),
            "cloudsdale" => Some(Self::Cloudsdale),
            _ => None,
        }
    }
}
