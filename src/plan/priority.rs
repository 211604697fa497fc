use chrono::{DateTime, Utc};

use super::classify::classify;
use crate::models::SessionRecord;

/// Returns the sessions ordered by display status rank, then due date.
///
/// The sort is stable and leaves the input untouched. Each record is
/// classified once, not once per comparison.
pub fn sort_by_priority(sessions: &[SessionRecord], now: DateTime<Utc>) -> Vec<SessionRecord> {
    let mut sorted = sessions.to_vec();
    sorted.sort_by_cached_key(|s| (classify(s, now).rank(), s.scheduled_date));
    sorted
}
