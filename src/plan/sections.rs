use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::classify::classify;
use crate::models::{DisplayStatus, SessionRecord};

/// Sessions partitioned by display status.
///
/// All four statuses are always present, possibly with an empty list.
/// Serializes as a map keyed by the kebab-case status names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StatusGroups {
    buckets: BTreeMap<DisplayStatus, Vec<SessionRecord>>,
}

impl Default for StatusGroups {
    fn default() -> Self {
        Self {
            buckets: DisplayStatus::ALL
                .into_iter()
                .map(|status| (status, Vec::new()))
                .collect(),
        }
    }
}

impl StatusGroups {
    pub fn get(&self, status: DisplayStatus) -> &[SessionRecord] {
        self.buckets.get(&status).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Buckets in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (DisplayStatus, &[SessionRecord])> {
        self.buckets
            .iter()
            .map(|(status, sessions)| (*status, sessions.as_slice()))
    }

    pub fn sections(&self) -> impl Iterator<Item = Section<'_>> {
        self.iter()
            .map(|(status, sessions)| Section { status, sessions })
    }

    pub fn count(&self, status: DisplayStatus) -> usize {
        self.get(status).len()
    }

    pub fn counts(&self) -> BTreeMap<DisplayStatus, usize> {
        self.iter()
            .map(|(status, sessions)| (status, sessions.len()))
            .collect()
    }

    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// One rendered section of the study plan.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    pub status: DisplayStatus,
    pub sessions: &'a [SessionRecord],
}

impl<'a> Section<'a> {
    /// The first `limit` sessions and how many are hidden behind "show more".
    /// A limit of zero shows everything.
    pub fn preview(&self, limit: usize) -> (&'a [SessionRecord], usize) {
        if limit == 0 || self.sessions.len() <= limit {
            (self.sessions, 0)
        } else {
            (&self.sessions[..limit], self.sessions.len() - limit)
        }
    }
}

/// Partitions already-sorted sessions in a single pass, keeping their order.
pub fn group_by_status(sorted: &[SessionRecord], now: DateTime<Utc>) -> StatusGroups {
    let mut groups = StatusGroups::default();
    for session in sorted {
        groups
            .buckets
            .entry(classify(session, now))
            .or_default()
            .push(session.clone());
    }
    groups
}
