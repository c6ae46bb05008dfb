pub mod aggregate;
pub mod events;
pub mod format;
pub mod region;
pub mod settings;
pub mod timsort;
pub mod user;

pub use aggregate::{Leaderboard, LeaderboardStats, aggregate, recency_cmp};
pub use events::*;
pub use region::Region;
pub use settings::*;
pub use user::*;
