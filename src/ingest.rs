use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult, RecordError};
use crate::models::{RawStatus, SessionRecord, SessionTopic};

/// A session as the backend sends it, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSessionRecord {
    pub id: Option<String>,
    pub study_plan_id: Option<String>,
    pub scheduled_date: Option<String>,
    pub status: Option<String>,
    pub completed_at: Option<String>,
    pub session_number: Option<u32>,
    pub estimated_time_minutes: Option<u32>,
    #[serde(default)]
    pub topics: Vec<SessionTopic>,
    pub total_questions: Option<u32>,
    pub completed_questions: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PlanBody {
    #[serde(default)]
    sessions: Vec<Value>,
}

// Accepted payload shapes, tried in order
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload {
    Sessions(Vec<Value>),
    StudyPlan { study_plan: PlanBody },
    Envelope { sessions: Vec<Value> },
}

impl Payload {
    fn into_sessions(self) -> Vec<Value> {
        match self {
            Payload::Sessions(sessions) => sessions,
            Payload::StudyPlan { study_plan } => study_plan.sessions,
            Payload::Envelope { sessions } => sessions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    pub index: usize,
    pub id: Option<String>,
    #[serde(serialize_with = "serialize_display")]
    pub error: RecordError,
}

fn serialize_display<S: Serializer>(err: &RecordError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(err)
}

#[derive(Debug, Clone, Default)]
pub struct Ingested {
    pub sessions: Vec<SessionRecord>,
    pub skipped: Vec<SkippedRecord>,
}

/// Parses a timestamp in any of the formats the backend emits.
///
/// Bare dates and naive timestamps are read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn validate(raw: RawSessionRecord) -> Result<SessionRecord, RecordError> {
    let id = raw
        .id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or(RecordError::MissingField("id"))?;

    let status_value = raw.status.ok_or(RecordError::MissingField("status"))?;
    let status =
        RawStatus::from_str(&status_value).ok_or(RecordError::UnknownStatus(status_value))?;

    let date_value = raw
        .scheduled_date
        .ok_or(RecordError::MissingField("scheduled_date"))?;
    let scheduled_date = parse_timestamp(&date_value).ok_or(RecordError::InvalidDate {
        field: "scheduled_date",
        value: date_value,
    })?;

    let completed_at = match raw.completed_at {
        Some(value) => Some(parse_timestamp(&value).ok_or(RecordError::InvalidDate {
            field: "completed_at",
            value,
        })?),
        None => None,
    };

    let completed_at = if status != RawStatus::Completed && completed_at.is_some() {
        warn!(
            id = %id,
            status = status.as_str(),
            "Ignoring completed_at on a session that is not completed"
        );
        None
    } else {
        completed_at
    };

    Ok(SessionRecord {
        id,
        study_plan_id: raw.study_plan_id,
        scheduled_date,
        status,
        completed_at,
        session_number: raw.session_number,
        estimated_time_minutes: raw.estimated_time_minutes,
        topics: raw.topics,
        total_questions: raw.total_questions,
        completed_questions: raw.completed_questions,
    })
}

/// Validates each element independently; bad records are skipped, never fatal.
pub fn ingest(values: Vec<Value>) -> Ingested {
    let mut ingested = Ingested::default();
    let mut seen = HashSet::new();

    for (index, value) in values.into_iter().enumerate() {
        let id_hint = value
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string);

        let result = serde_json::from_value::<RawSessionRecord>(value)
            .map_err(|e| RecordError::Malformed(e.to_string()))
            .and_then(validate)
            .and_then(|session| {
                if seen.insert(session.id.clone()) {
                    Ok(session)
                } else {
                    Err(RecordError::DuplicateId(session.id))
                }
            });

        match result {
            Ok(session) => ingested.sessions.push(session),
            Err(error) => {
                warn!(
                    index,
                    id = id_hint.as_deref().unwrap_or("-"),
                    error = %error,
                    "Skipping invalid session record"
                );
                ingested.skipped.push(SkippedRecord {
                    index,
                    id: id_hint,
                    error,
                });
            }
        }
    }

    debug!(
        valid = ingested.sessions.len(),
        skipped = ingested.skipped.len(),
        "Ingested session records"
    );
    ingested
}

pub fn parse_payload(text: &str) -> AppResult<Ingested> {
    let payload: Payload = serde_json::from_str(text)?;
    Ok(ingest(payload.into_sessions()))
}

pub fn load_reader<R: Read>(mut reader: R) -> AppResult<Ingested> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_payload(&text)
}

/// Loads a payload from a file, or from stdin when the path is `-`.
pub fn load_path(path: &Path) -> AppResult<Ingested> {
    if path == Path::new("-") {
        return load_reader(std::io::stdin().lock());
    }

    let text = std::fs::read_to_string(path).map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_payload(&text)
}
