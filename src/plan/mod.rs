pub mod classify;
pub mod priority;
pub mod sections;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::ingest::{Ingested, SkippedRecord};
use crate::models::{DisplayStatus, SessionRecord};

use priority::sort_by_priority;
use sections::{group_by_status, StatusGroups};

/// Everything the renderers need for one pass over a session snapshot.
#[derive(Debug, Clone)]
pub struct StudyPlanView {
    pub now: DateTime<Utc>,
    pub groups: StatusGroups,
    pub skipped: Vec<SkippedRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanStats {
    pub total_sessions: usize,
    pub overdue: usize,
    pub in_progress: usize,
    pub upcoming: usize,
    pub completed: usize,
    pub skipped: usize,
    pub completion_rate: f64,
    pub total_questions: u64,
    pub answered_questions: u64,
    pub minutes_remaining: u64,
}

impl StudyPlanView {
    pub fn build(ingested: Ingested, now: DateTime<Utc>) -> Self {
        let sorted = sort_by_priority(&ingested.sessions, now);
        let groups = group_by_status(&sorted, now);
        debug!(
            overdue = groups.count(DisplayStatus::Overdue),
            in_progress = groups.count(DisplayStatus::InProgress),
            upcoming = groups.count(DisplayStatus::Upcoming),
            completed = groups.count(DisplayStatus::Completed),
            "Built study plan view"
        );
        Self {
            now,
            groups,
            skipped: ingested.skipped,
        }
    }

    /// Sessions in priority order, each with its display status.
    pub fn ordered(&self) -> impl Iterator<Item = (DisplayStatus, &SessionRecord)> {
        self.groups
            .iter()
            .flat_map(|(status, sessions)| sessions.iter().map(move |s| (status, s)))
    }

    /// The most urgent session that still needs work.
    pub fn next_session(&self) -> Option<(DisplayStatus, &SessionRecord)> {
        self.ordered()
            .find(|(status, _)| *status != DisplayStatus::Completed)
    }

    pub fn find(&self, id: &str) -> Option<(DisplayStatus, &SessionRecord)> {
        self.ordered().find(|(_, s)| s.id == id)
    }

    pub fn stats(&self) -> PlanStats {
        let total_sessions = self.groups.total();
        let completed = self.groups.count(DisplayStatus::Completed);

        let mut total_questions = 0u64;
        let mut answered_questions = 0u64;
        let mut minutes_remaining = 0u64;
        for (status, session) in self.ordered() {
            total_questions += u64::from(session.question_count());
            answered_questions += u64::from(session.answered_count());
            if status != DisplayStatus::Completed {
                minutes_remaining += u64::from(session.estimated_time_minutes.unwrap_or(0));
            }
        }

        let completion_rate = if total_sessions == 0 {
            0.0
        } else {
            (completed as f64 / total_sessions as f64) * 100.0
        };

        PlanStats {
            total_sessions,
            overdue: self.groups.count(DisplayStatus::Overdue),
            in_progress: self.groups.count(DisplayStatus::InProgress),
            upcoming: self.groups.count(DisplayStatus::Upcoming),
            completed,
            skipped: self.skipped.len(),
            completion_rate,
            total_questions,
            answered_questions,
            minutes_remaining,
        }
    }
}
