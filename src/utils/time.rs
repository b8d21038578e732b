use chrono::{DateTime, Duration, Utc};

/// Current time as a unix timestamp in seconds
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Absolute expiry for a token that lives `expires_in` seconds from `now`
pub fn expires_at_from(now: i64, expires_in: i64) -> i64 {
    now.saturating_add(expires_in.max(0))
}

/// Whether a session expiring at `expires_at` needs a refresh at `now`.
/// Sessions within `margin_secs` of expiry count as expiring.
pub fn is_expiring(expires_at: i64, now: i64, margin_secs: i64) -> bool {
    expires_at.saturating_sub(margin_secs.max(0)) <= now
}

/// Expiry of a session cookie issued at `now`
pub fn cookie_expiry(now: DateTime<Utc>, lifetime_days: i64) -> DateTime<Utc> {
    now + Duration::days(lifetime_days.max(1))
}
