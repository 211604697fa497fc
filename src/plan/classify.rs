use chrono::{DateTime, Utc};

use crate::models::{DisplayStatus, RawStatus, SessionRecord};

/// Maps a session to the status it is shown under at `now`.
///
/// Completed and in-progress sessions ignore the date. A pending session is
/// overdue only when it was due strictly before `now`.
pub fn classify(session: &SessionRecord, now: DateTime<Utc>) -> DisplayStatus {
    match session.status {
        RawStatus::Completed => DisplayStatus::Completed,
        RawStatus::InProgress => DisplayStatus::InProgress,
        RawStatus::Pending if session.scheduled_date < now => DisplayStatus::Overdue,
        RawStatus::Pending => DisplayStatus::Upcoming,
    }
}
