use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsersFilter {
    #[default]
    ShowAll,
    Online,
    Offline,
}

impl UsersFilter {
    pub const ALL: [UsersFilter; 3] = [Self::ShowAll, Self::Online, Self::Offline];

    pub fn label(self) -> &'static str {
        match self {
            Self::ShowAll => "show all",
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.label() == label)
    }

    pub fn keeps(self, online: bool) -> bool {
        match self {
            Self::ShowAll => true,
            Self::Online => online,
            Self::Offline => !online,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsersSort {
    /// Keep feed order (total time, highest first).
    #[default]
    TotalTime,
    SinceOnline,
}

impl UsersSort {
    pub const ALL: [UsersSort; 2] = [Self::TotalTime, Self::SinceOnline];

    pub fn label(self) -> &'static str {
        match self {
            Self::TotalTime => "total time",
            Self::SinceOnline => "since online",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.label() == label)
    }
}

/// Two-state picker value used by the bots and tourists toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Hide,
    Show,
}

impl Visibility {
    pub const ALL: [Visibility; 2] = [Self::Hide, Self::Show];

    pub fn label(self) -> &'static str {
        match self {
            Self::Hide => "hide",
            Self::Show => "show",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.label() == label)
    }

    pub fn is_shown(self) -> bool {
        self == Self::Show
    }
}

impl From<bool> for Visibility {
    fn from(shown: bool) -> Self {
        if shown { Self::Show } else { Self::Hide }
    }
}

/// View-local leaderboard options. Lives only as long as the view does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    pub filter: UsersFilter,
    pub sort: UsersSort,
    pub show_bots: bool,
    pub show_tourists: bool,
}
