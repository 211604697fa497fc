use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Lifecycle flag as recorded by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawStatus {
    Pending,
    InProgress,
    Completed,
}

impl RawStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RawStatus::Pending => "pending",
            RawStatus::InProgress => "in_progress",
            RawStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(RawStatus::Pending),
            "in_progress" => Some(RawStatus::InProgress),
            "completed" => Some(RawStatus::Completed),
            _ => None,
        }
    }
}

/// Status shown in the study plan, derived from the raw status and the clock.
///
/// Variants are declared in priority order, so the derived `Ord` sorts
/// overdue sessions first and completed ones last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayStatus {
    Overdue,
    InProgress,
    Upcoming,
    Completed,
}

impl DisplayStatus {
    pub const ALL: [DisplayStatus; 4] = [
        DisplayStatus::Overdue,
        DisplayStatus::InProgress,
        DisplayStatus::Upcoming,
        DisplayStatus::Completed,
    ];

    pub fn rank(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayStatus::Overdue => "overdue",
            DisplayStatus::InProgress => "in-progress",
            DisplayStatus::Upcoming => "upcoming",
            DisplayStatus::Completed => "completed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DisplayStatus::Overdue => "Overdue",
            DisplayStatus::InProgress => "In Progress",
            DisplayStatus::Upcoming => "Upcoming",
            DisplayStatus::Completed => "Completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "overdue" | "o" => Some(DisplayStatus::Overdue),
            "in-progress" | "in_progress" | "i" => Some(DisplayStatus::InProgress),
            "upcoming" | "u" => Some(DisplayStatus::Upcoming),
            "completed" | "done" | "c" => Some(DisplayStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTopic {
    #[serde(default)]
    pub topic_id: Option<String>,
    pub topic_name: String,
    #[serde(default)]
    pub num_questions: u32,
}

// A validated practice session, as handed to the classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub study_plan_id: Option<String>,
    pub scheduled_date: DateTime<Utc>,
    pub status: RawStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub session_number: Option<u32>,
    pub estimated_time_minutes: Option<u32>,
    pub topics: Vec<SessionTopic>,
    pub total_questions: Option<u32>,
    pub completed_questions: Option<u32>,
}

impl SessionRecord {
    pub fn title(&self) -> String {
        match self.session_number {
            Some(n) => format!("Session {}", n),
            None => format!("Session {}", self.id),
        }
    }

    pub fn topic_summary(&self) -> String {
        if self.topics.is_empty() {
            String::from("-")
        } else {
            self.topics
                .iter()
                .map(|t| t.topic_name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        }
    }

    pub fn question_count(&self) -> u32 {
        self.total_questions
            .unwrap_or_else(|| self.topics.iter().map(|t| t.num_questions).sum())
    }

    pub fn answered_count(&self) -> u32 {
        self.completed_questions.unwrap_or(0).min(self.question_count())
    }

    pub fn progress_percent(&self) -> f64 {
        let total = self.question_count();
        if total == 0 {
            0.0
        } else {
            (self.answered_count() as f64 / total as f64) * 100.0
        }
    }
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
    }

    pub fn session(id: &str, status: RawStatus, scheduled_date: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            id: id.to_string(),
            study_plan_id: None,
            scheduled_date,
            status,
            completed_at: None,
            session_number: None,
            estimated_time_minutes: None,
            topics: Vec::new(),
            total_questions: None,
            completed_questions: None,
        }
    }
}
