//! Poll edit tracking.
//!
//! A vote is stale when its poll was edited after the vote was cast. Edits
//! must therefore move `updated_at` strictly forward, even when the wall
//! clock does not.

use chrono::{DateTime, Duration, FixedOffset, Utc};

/// Smallest step the store can represent.
fn tick() -> Duration {
    Duration::microseconds(1)
}

/// Timestamp to record for an edit made at `now` on a poll last updated at
/// `previous`.
#[must_use]
pub fn next_updated_at(
    previous: DateTime<FixedOffset>,
    now: DateTime<Utc>,
) -> DateTime<FixedOffset> {
    let now: DateTime<FixedOffset> = now.into();
    if now > previous { now } else { previous + tick() }
}

/// Timestamp to record for a vote cast at `now` on a poll last updated at
/// `updated_at`.
///
/// Never earlier than `updated_at`, so a fresh vote is never reported as
/// predating the poll's latest edit.
#[must_use]
pub fn vote_time(updated_at: DateTime<FixedOffset>, now: DateTime<Utc>) -> DateTime<FixedOffset> {
    let now: DateTime<FixedOffset> = now.into();
    now.max(updated_at)
}

/// Whether a poll updated at `updated_at` was edited after a vote cast at
/// `voted_at`.
#[must_use]
pub fn edited_after_vote(updated_at: DateTime<FixedOffset>, voted_at: DateTime<FixedOffset>) -> bool {
    updated_at > voted_at
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
    }

    #[test]
    fn test_next_updated_at_uses_clock_when_ahead() {
        let previous = at(100).into();
        assert_eq!(next_updated_at(previous, at(200)), at(200));
    }

    #[test]
    fn test_next_updated_at_advances_on_equal_clock() {
        let previous: DateTime<FixedOffset> = at(100).into();
        let next = next_updated_at(previous, at(100));
        assert!(next > previous);
        assert_eq!(next - previous, tick());
    }

    #[test]
    fn test_next_updated_at_advances_on_clock_regression() {
        let previous: DateTime<FixedOffset> = at(100).into();
        let next = next_updated_at(previous, at(50));
        assert!(next > previous);
    }

    #[test]
    fn test_vote_time_never_precedes_edit() {
        let updated_at: DateTime<FixedOffset> = at(100).into();
        assert_eq!(vote_time(updated_at, at(50)), updated_at);
        assert_eq!(vote_time(updated_at, at(150)), at(150));
        assert!(!edited_after_vote(updated_at, vote_time(updated_at, at(50))));
    }

    #[test]
    fn test_edited_after_vote_is_strict() {
        let t: DateTime<FixedOffset> = at(100).into();
        assert!(!edited_after_vote(t, t));
        assert!(edited_after_vote(t + tick(), t));
        assert!(!edited_after_vote(t, t + tick()));
    }
}
