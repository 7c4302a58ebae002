//! Timestamp utilities
//!
//! Timestamps are persisted as Unix milliseconds.

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert a timestamp to its stored form
pub fn to_millis(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp_millis()
}

/// Convert a stored millisecond value back to a timestamp
///
/// Out-of-range values clamp to the Unix epoch.
pub fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Convert a std duration to a chrono duration, saturating on overflow
pub fn to_chrono(duration: std::time::Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

/// `timestamp + duration`, clamped to the latest representable instant
pub fn add_saturating(timestamp: DateTime<Utc>, duration: std::time::Duration) -> DateTime<Utc> {
    timestamp
        .checked_add_signed(to_chrono(duration))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// `timestamp - duration`, clamped to the earliest representable instant
pub fn sub_saturating(timestamp: DateTime<Utc>, duration: std::time::Duration) -> DateTime<Utc> {
    timestamp
        .checked_sub_signed(to_chrono(duration))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_millis_conversion_preserves_precision() {
        let timestamp = from_millis(1_700_000_000_123);
        assert_eq!(to_millis(timestamp), 1_700_000_000_123);
    }

    #[test]
    fn test_from_millis_out_of_range_clamps_to_epoch() {
        assert_eq!(from_millis(i64::MAX), DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_to_chrono_one_week() {
        let week = to_chrono(Duration::from_secs(7 * 24 * 3600));
        assert_eq!(week.num_days(), 7);
    }

    #[test]
    fn test_add_sub_saturate() {
        let t = from_millis(0);
        assert_eq!(add_saturating(t, Duration::MAX), DateTime::<Utc>::MAX_UTC);
        assert_eq!(sub_saturating(t, Duration::MAX), DateTime::<Utc>::MIN_UTC);
        assert_eq!(to_millis(add_saturating(t, Duration::from_secs(1))), 1000);
    }

    #[test]
    fn test_to_chrono_saturates() {
        assert_eq!(to_chrono(Duration::MAX), chrono::Duration::MAX);
    }
}
