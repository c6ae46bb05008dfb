use chrono::{DateTime, Utc};

/// Insert `,` thousands separators (e.g. 1234567 -> "1,234,567").
pub fn add_separators(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format cumulative minutes as hours and minutes ("45m", "2h 5m", "1,234h").
pub fn format_minutes(minutes: u64) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    match (hours, rest) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{}h", add_separators(h)),
        (h, m) => format!("{}h {m}m", add_separators(h)),
    }
}

/// Relative "last seen" text for an offline user.
pub fn format_since(last_seen: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(last_seen).num_seconds();
    if secs < 60 {
        return "just now".to_string();
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{mins}m ago");
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{days}d ago");
    }
    if days < 30 {
        return format!("{}w ago", days / 7);
    }
    if days < 365 {
        return format!("{}mo ago", days / 30);
    }
    format!("{}y ago", days / 365)
}

/// Width of a user's time bar relative to the leader, in `[0, 1]`.
pub fn bar_fraction(minutes: u64, max_minutes: u64) -> f64 {
    if max_minutes == 0 {
        return 0.0;
    }
    (minutes as f64 / max_minutes as f64).clamp(0.0, 1.0)
}
