use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use std::path::Path;

use crate::timer::{PracticeTimer, TimerMode};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            -- Local practice timers, one per session
            CREATE TABLE IF NOT EXISTS practice_timers (
                session_id TEXT PRIMARY KEY,
                mode TEXT NOT NULL CHECK(mode IN ('stopwatch', 'countdown')),
                duration_secs INTEGER,
                elapsed_secs INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_timers_updated ON practice_timers(updated_at);
            "#,
        )?;
        Ok(())
    }

    /// Stores the timer as of `now`. Running time is folded into the stored
    /// elapsed value, so the row never records a running clock.
    pub fn save_timer(&self, timer: &PracticeTimer, now: DateTime<Utc>) -> Result<()> {
        let stored = timer.snapshot(now);
        self.conn.execute(
            r#"
            INSERT INTO practice_timers (session_id, mode, duration_secs, elapsed_secs, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(session_id) DO UPDATE SET
                mode = excluded.mode,
                duration_secs = excluded.duration_secs,
                elapsed_secs = excluded.elapsed_secs,
                updated_at = excluded.updated_at
            "#,
            params![
                stored.session_id,
                stored.mode.as_str(),
                stored.mode.duration_secs(),
                stored.elapsed_secs,
                stored.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Restored timers always come back paused.
    pub fn load_timer(&self, session_id: &str) -> Result<Option<PracticeTimer>> {
        self.conn
            .query_row(
                "SELECT session_id, mode, duration_secs, elapsed_secs, updated_at
                 FROM practice_timers WHERE session_id = ?1",
                params![session_id],
                row_to_timer,
            )
            .optional()
    }

    pub fn list_timers(&self) -> Result<Vec<PracticeTimer>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, mode, duration_secs, elapsed_secs, updated_at
             FROM practice_timers ORDER BY updated_at DESC, session_id",
        )?;
        let timers = stmt.query_map([], row_to_timer)?;
        timers.collect()
    }

    pub fn delete_timer(&self, session_id: &str) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM practice_timers WHERE session_id = ?1",
            params![session_id],
        )?;
        Ok(rows > 0)
    }
}

fn row_to_timer(row: &Row<'_>) -> Result<PracticeTimer> {
    let mode_text: String = row.get(1)?;
    let duration_secs: Option<i64> = row.get(2)?;
    let updated_text: String = row.get(4)?;

    let mode = TimerMode::from_parts(&mode_text, duration_secs).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("invalid timer mode '{}'", mode_text).into(),
        )
    })?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(PracticeTimer {
        session_id: row.get(0)?,
        mode,
        elapsed_secs: row.get(3)?,
        running_since: None,
        updated_at,
    })
}
